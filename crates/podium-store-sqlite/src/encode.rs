//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates ISO 8601. Enums are stored
//! as their lowercase strum names. Structured fields (points tables, match
//! sides, medal breakdowns) are compact JSON. UUIDs are hyphenated lowercase.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use podium_core::{
  champion::OverallChampion,
  entity::{EntityKind, EntityRef},
  lifecycle::{ResolvedResult, ResultStatus},
  placement::{PointsTable, VerifiedResult},
  ranking::{MatchResult, MatchSide, Ranking},
  scope::{RankingScope, ScopeDefinition, ScopeKey},
  tally::{MedalEntry, MedalTally},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

/// Parse a strum-encoded enum column.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::UnknownValue { column, value: s.to_owned() })
}

fn count(n: i64) -> u32 { u32::try_from(n).unwrap_or(0) }

// ─── Scopes ──────────────────────────────────────────────────────────────────

pub const SCOPE_COLUMNS: &str =
  "scope_key, season, level, sport_id, tournament_id, division, category, closed, points_json, defined_at";

pub struct RawScope {
  pub scope_key:     String,
  pub season:        String,
  pub level:         String,
  pub sport_id:      Option<String>,
  pub tournament_id: Option<String>,
  pub division:      Option<String>,
  pub category:      Option<String>,
  pub closed:        bool,
  pub points_json:   Option<String>,
  pub defined_at:    String,
}

impl RawScope {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      scope_key:     row.get(0)?,
      season:        row.get(1)?,
      level:         row.get(2)?,
      sport_id:      row.get(3)?,
      tournament_id: row.get(4)?,
      division:      row.get(5)?,
      category:      row.get(6)?,
      closed:        row.get(7)?,
      points_json:   row.get(8)?,
      defined_at:    row.get(9)?,
    })
  }

  pub fn from_definition(def: &ScopeDefinition) -> Result<Self> {
    let key = &def.key;
    Ok(Self {
      scope_key:     key.canonical(),
      season:        key.season.clone(),
      level:         key.level.as_ref().to_owned(),
      sport_id:      key.sport_id.map(encode_uuid),
      tournament_id: key.tournament_id.map(encode_uuid),
      division:      key.division.clone(),
      category:      key.category.clone(),
      closed:        def.closed,
      points_json:   def.points.as_ref().map(serde_json::to_string).transpose()?,
      defined_at:    encode_dt(def.defined_at),
    })
  }

  pub fn into_definition(self) -> Result<ScopeDefinition> {
    let points: Option<PointsTable> = self
      .points_json
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;
    Ok(ScopeDefinition {
      key: ScopeKey {
        season:        self.season,
        level:         decode_enum("level", &self.level)?,
        sport_id:      decode_opt_uuid(self.sport_id)?,
        tournament_id: decode_opt_uuid(self.tournament_id)?,
        division:      self.division,
        category:      self.category,
      },
      closed: self.closed,
      points,
      defined_at: decode_dt(&self.defined_at)?,
    })
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// `results` columns, prefixed for the lifecycle join.
pub const RESULT_COLUMNS: &str = "r.result_id, r.participant_kind, r.participant_id, \
   r.participant_name, r.school_id, r.school_name, r.region, r.province, r.sport_id, \
   r.tournament_id, r.level, r.season, r.division, r.category, r.event, r.position, \
   r.medal_type, r.competition_date, r.result_format, r.recorded_at";

/// Raw strings read directly from a `results` row joined with lifecycle tables.
pub struct RawResult {
  pub result_id:         String,
  pub participant_kind:  String,
  pub participant_id:    String,
  pub participant_name:  String,
  pub school_id:         Option<String>,
  pub school_name:       Option<String>,
  pub region:            Option<String>,
  pub province:          Option<String>,
  pub sport_id:          String,
  pub tournament_id:     String,
  pub level:             String,
  pub season:            String,
  pub division:          String,
  pub category:          String,
  pub event:             String,
  pub position:          i64,
  pub medal_type:        String,
  pub competition_date:  String,
  pub result_format:     String,
  pub recorded_at:       String,
  // lifecycle joins
  pub superseded_by:     Option<String>,
  pub superseded_at:     Option<String>,
  pub retraction_reason: Option<String>,
  pub retracted_at:      Option<String>,
}

impl RawResult {
  /// Read a row selected as `RESULT_COLUMNS` followed by the four lifecycle
  /// columns.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      result_id:         row.get(0)?,
      participant_kind:  row.get(1)?,
      participant_id:    row.get(2)?,
      participant_name:  row.get(3)?,
      school_id:         row.get(4)?,
      school_name:       row.get(5)?,
      region:            row.get(6)?,
      province:          row.get(7)?,
      sport_id:          row.get(8)?,
      tournament_id:     row.get(9)?,
      level:             row.get(10)?,
      season:            row.get(11)?,
      division:          row.get(12)?,
      category:          row.get(13)?,
      event:             row.get(14)?,
      position:          row.get(15)?,
      medal_type:        row.get(16)?,
      competition_date:  row.get(17)?,
      result_format:     row.get(18)?,
      recorded_at:       row.get(19)?,
      superseded_by:     row.get(20)?,
      superseded_at:     row.get(21)?,
      retraction_reason: row.get(22)?,
      retracted_at:      row.get(23)?,
    })
  }

  pub fn from_result(r: &VerifiedResult) -> Self {
    Self {
      result_id:         encode_uuid(r.result_id),
      participant_kind:  r.participant.kind.as_ref().to_owned(),
      participant_id:    encode_uuid(r.participant.id),
      participant_name:  r.participant_name.clone(),
      school_id:         r.school_id.map(encode_uuid),
      school_name:       r.school_name.clone(),
      region:            r.region.clone(),
      province:          r.province.clone(),
      sport_id:          encode_uuid(r.sport_id),
      tournament_id:     encode_uuid(r.tournament_id),
      level:             r.level.as_ref().to_owned(),
      season:            r.season.trim().to_owned(),
      division:          r.division.clone(),
      category:          r.category.clone(),
      event:             r.event.clone(),
      position:          i64::from(r.position),
      medal_type:        r.medal_type.as_ref().to_owned(),
      competition_date:  encode_date(r.competition_date),
      result_format:     r.result_format.as_ref().to_owned(),
      recorded_at:       encode_dt(r.recorded_at),
      superseded_by:     None,
      superseded_at:     None,
      retraction_reason: None,
      retracted_at:      None,
    }
  }

  pub fn into_resolved(self) -> Result<ResolvedResult> {
    let status = if let (Some(by), Some(at)) = (&self.superseded_by, &self.superseded_at) {
      ResultStatus::Superseded { by: decode_uuid(by)?, at: decode_dt(at)? }
    } else if let Some(at) = &self.retracted_at {
      ResultStatus::Retracted {
        reason: self.retraction_reason.clone(),
        at:     decode_dt(at)?,
      }
    } else {
      ResultStatus::Active
    };

    let result = VerifiedResult {
      result_id:        decode_uuid(&self.result_id)?,
      recorded_at:      decode_dt(&self.recorded_at)?,
      participant:      EntityRef::new(
        decode_enum("participant_kind", &self.participant_kind)?,
        decode_uuid(&self.participant_id)?,
      ),
      participant_name: self.participant_name,
      school_id:        decode_opt_uuid(self.school_id)?,
      school_name:      self.school_name,
      region:           self.region,
      province:         self.province,
      sport_id:         decode_uuid(&self.sport_id)?,
      tournament_id:    decode_uuid(&self.tournament_id)?,
      level:            decode_enum("level", &self.level)?,
      season:           self.season,
      division:         self.division,
      category:         self.category,
      event:            self.event,
      position:         count(self.position),
      medal_type:       decode_enum("medal_type", &self.medal_type)?,
      competition_date: decode_date(&self.competition_date)?,
      result_format:    decode_enum("result_format", &self.result_format)?,
    };
    Ok(ResolvedResult { result, status })
  }
}

// ─── Matches ─────────────────────────────────────────────────────────────────

pub const MATCH_COLUMNS: &str = "match_id, sport_id, tournament_id, level, season, \
   division, category, home_json, away_json, played_on, recorded_at";

pub struct RawMatch {
  pub match_id:      String,
  pub sport_id:      String,
  pub tournament_id: String,
  pub level:         String,
  pub season:        String,
  pub division:      String,
  pub category:      String,
  pub home_json:     String,
  pub away_json:     String,
  pub played_on:     String,
  pub recorded_at:   String,
}

impl RawMatch {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_id:      row.get(0)?,
      sport_id:      row.get(1)?,
      tournament_id: row.get(2)?,
      level:         row.get(3)?,
      season:        row.get(4)?,
      division:      row.get(5)?,
      category:      row.get(6)?,
      home_json:     row.get(7)?,
      away_json:     row.get(8)?,
      played_on:     row.get(9)?,
      recorded_at:   row.get(10)?,
    })
  }

  pub fn from_match(m: &MatchResult) -> Result<Self> {
    Ok(Self {
      match_id:      encode_uuid(m.match_id),
      sport_id:      encode_uuid(m.sport_id),
      tournament_id: encode_uuid(m.tournament_id),
      level:         m.level.as_ref().to_owned(),
      season:        m.season.trim().to_owned(),
      division:      m.division.clone(),
      category:      m.category.clone(),
      home_json:     serde_json::to_string(&m.home)?,
      away_json:     serde_json::to_string(&m.away)?,
      played_on:     encode_date(m.played_on),
      recorded_at:   encode_dt(m.recorded_at),
    })
  }

  pub fn into_match(self) -> Result<MatchResult> {
    let home: MatchSide = serde_json::from_str(&self.home_json)?;
    let away: MatchSide = serde_json::from_str(&self.away_json)?;
    Ok(MatchResult {
      match_id: decode_uuid(&self.match_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
      sport_id: decode_uuid(&self.sport_id)?,
      tournament_id: decode_uuid(&self.tournament_id)?,
      level: decode_enum("level", &self.level)?,
      season: self.season,
      division: self.division,
      category: self.category,
      home,
      away,
      played_on: decode_date(&self.played_on)?,
    })
  }
}

// ─── Tallies ─────────────────────────────────────────────────────────────────

pub const TALLY_COLUMNS: &str = "entity_kind, entity_id, generation, entity_name, region, \
   province, tally_date, period_start, period_end, gold_medals, silver_medals, \
   bronze_medals, total_medals, gold_points, silver_points, bronze_points, total_points, \
   rank, previous_rank, medal_breakdown, is_current, is_final";

/// A `tallies` row minus its scope key.
pub struct TallyRow {
  pub entity_kind:     String,
  pub entity_id:       String,
  pub generation:      i64,
  pub entity_name:     String,
  pub region:          Option<String>,
  pub province:        Option<String>,
  pub tally_date:      String,
  pub period_start:    Option<String>,
  pub period_end:      Option<String>,
  pub gold_medals:     i64,
  pub silver_medals:   i64,
  pub bronze_medals:   i64,
  pub total_medals:    i64,
  pub gold_points:     f64,
  pub silver_points:   f64,
  pub bronze_points:   f64,
  pub total_points:    f64,
  pub rank:            i64,
  pub previous_rank:   Option<i64>,
  pub medal_breakdown: String,
  pub is_current:      bool,
  pub is_final:        bool,
}

impl TallyRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entity_kind:     row.get(0)?,
      entity_id:       row.get(1)?,
      generation:      row.get(2)?,
      entity_name:     row.get(3)?,
      region:          row.get(4)?,
      province:        row.get(5)?,
      tally_date:      row.get(6)?,
      period_start:    row.get(7)?,
      period_end:      row.get(8)?,
      gold_medals:     row.get(9)?,
      silver_medals:   row.get(10)?,
      bronze_medals:   row.get(11)?,
      total_medals:    row.get(12)?,
      gold_points:     row.get(13)?,
      silver_points:   row.get(14)?,
      bronze_points:   row.get(15)?,
      total_points:    row.get(16)?,
      rank:            row.get(17)?,
      previous_rank:   row.get(18)?,
      medal_breakdown: row.get(19)?,
      is_current:      row.get(20)?,
      is_final:        row.get(21)?,
    })
  }

  pub fn from_tally(t: &MedalTally) -> Result<Self> {
    Ok(Self {
      entity_kind:     t.entity.kind.as_ref().to_owned(),
      entity_id:       encode_uuid(t.entity.id),
      generation:      t.generation as i64,
      entity_name:     t.entity_name.clone(),
      region:          t.region.clone(),
      province:        t.province.clone(),
      tally_date:      encode_date(t.tally_date),
      period_start:    t.period_start.map(encode_date),
      period_end:      t.period_end.map(encode_date),
      gold_medals:     i64::from(t.gold_medals),
      silver_medals:   i64::from(t.silver_medals),
      bronze_medals:   i64::from(t.bronze_medals),
      total_medals:    i64::from(t.total_medals),
      gold_points:     t.gold_points,
      silver_points:   t.silver_points,
      bronze_points:   t.bronze_points,
      total_points:    t.total_points,
      rank:            i64::from(t.rank),
      previous_rank:   t.previous_rank.map(i64::from),
      medal_breakdown: serde_json::to_string(&t.medal_breakdown)?,
      is_current:      t.is_current,
      is_final:        t.is_final,
    })
  }

  pub fn into_tally(self, scope: &ScopeKey) -> Result<MedalTally> {
    let medal_breakdown: Vec<MedalEntry> = serde_json::from_str(&self.medal_breakdown)?;
    Ok(MedalTally {
      entity: EntityRef::new(
        decode_enum::<EntityKind>("entity_kind", &self.entity_kind)?,
        decode_uuid(&self.entity_id)?,
      ),
      entity_name: self.entity_name,
      scope: scope.clone(),
      region: self.region,
      province: self.province,
      tally_date: decode_date(&self.tally_date)?,
      period_start: decode_opt_date(self.period_start)?,
      period_end: decode_opt_date(self.period_end)?,
      gold_medals: count(self.gold_medals),
      silver_medals: count(self.silver_medals),
      bronze_medals: count(self.bronze_medals),
      total_medals: count(self.total_medals),
      gold_points: self.gold_points,
      silver_points: self.silver_points,
      bronze_points: self.bronze_points,
      total_points: self.total_points,
      rank: count(self.rank),
      previous_rank: self.previous_rank.map(count),
      medal_breakdown,
      generation: self.generation as u64,
      is_current: self.is_current,
      is_final: self.is_final,
    })
  }
}

// ─── Rankings ────────────────────────────────────────────────────────────────

pub const RANKING_COLUMNS: &str = "entity_kind, entity_id, generation, entity_name, \
   current_rank, previous_rank, rank_change, points, rating, gold_medals, silver_medals, \
   bronze_medals, total_medals, matches_played, wins, losses, draws, win_percentage, \
   points_for, points_against, point_differential, is_current, is_final";

/// A `rankings` row minus its scope key.
pub struct RankingRow {
  pub entity_kind:        String,
  pub entity_id:          String,
  pub generation:         i64,
  pub entity_name:        String,
  pub current_rank:       i64,
  pub previous_rank:      Option<i64>,
  pub rank_change:        i64,
  pub points:             f64,
  pub rating:             f64,
  pub gold_medals:        i64,
  pub silver_medals:      i64,
  pub bronze_medals:      i64,
  pub total_medals:       i64,
  pub matches_played:     i64,
  pub wins:               i64,
  pub losses:             i64,
  pub draws:              i64,
  pub win_percentage:     f64,
  pub points_for:         i64,
  pub points_against:     i64,
  pub point_differential: i64,
  pub is_current:         bool,
  pub is_final:           bool,
}

impl RankingRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entity_kind:        row.get(0)?,
      entity_id:          row.get(1)?,
      generation:         row.get(2)?,
      entity_name:        row.get(3)?,
      current_rank:       row.get(4)?,
      previous_rank:      row.get(5)?,
      rank_change:        row.get(6)?,
      points:             row.get(7)?,
      rating:             row.get(8)?,
      gold_medals:        row.get(9)?,
      silver_medals:      row.get(10)?,
      bronze_medals:      row.get(11)?,
      total_medals:       row.get(12)?,
      matches_played:     row.get(13)?,
      wins:               row.get(14)?,
      losses:             row.get(15)?,
      draws:              row.get(16)?,
      win_percentage:     row.get(17)?,
      points_for:         row.get(18)?,
      points_against:     row.get(19)?,
      point_differential: row.get(20)?,
      is_current:         row.get(21)?,
      is_final:           row.get(22)?,
    })
  }

  pub fn from_ranking(r: &Ranking) -> Self {
    Self {
      entity_kind:        r.entity.kind.as_ref().to_owned(),
      entity_id:          encode_uuid(r.entity.id),
      generation:         r.generation as i64,
      entity_name:        r.entity_name.clone(),
      current_rank:       i64::from(r.current_rank),
      previous_rank:      r.previous_rank.map(i64::from),
      rank_change:        r.rank_change,
      points:             r.points,
      rating:             r.rating,
      gold_medals:        i64::from(r.gold_medals),
      silver_medals:      i64::from(r.silver_medals),
      bronze_medals:      i64::from(r.bronze_medals),
      total_medals:       i64::from(r.total_medals),
      matches_played:     i64::from(r.matches_played),
      wins:               i64::from(r.wins),
      losses:             i64::from(r.losses),
      draws:              i64::from(r.draws),
      win_percentage:     r.win_percentage,
      points_for:         r.points_for as i64,
      points_against:     r.points_against as i64,
      point_differential: r.point_differential,
      is_current:         r.is_current,
      is_final:           r.is_final,
    }
  }

  pub fn into_ranking(self, scope: &RankingScope) -> Result<Ranking> {
    Ok(Ranking {
      entity:             EntityRef::new(
        decode_enum("entity_kind", &self.entity_kind)?,
        decode_uuid(&self.entity_id)?,
      ),
      entity_name:        self.entity_name,
      scope:              scope.clone(),
      current_rank:       count(self.current_rank),
      previous_rank:      self.previous_rank.map(count),
      rank_change:        self.rank_change,
      points:             self.points,
      rating:             self.rating,
      gold_medals:        count(self.gold_medals),
      silver_medals:      count(self.silver_medals),
      bronze_medals:      count(self.bronze_medals),
      total_medals:       count(self.total_medals),
      matches_played:     count(self.matches_played),
      wins:               count(self.wins),
      losses:             count(self.losses),
      draws:              count(self.draws),
      win_percentage:     self.win_percentage,
      points_for:         self.points_for.max(0) as u64,
      points_against:     self.points_against.max(0) as u64,
      point_differential: self.point_differential,
      generation:         self.generation as u64,
      is_current:         self.is_current,
      is_final:           self.is_final,
    })
  }
}

// ─── Champions ───────────────────────────────────────────────────────────────

pub const CHAMPION_COLUMNS: &str = "year, level, category, generation, rank, school_id, \
   school_name, points, gold_medals, silver_medals, bronze_medals, total_medals, region, \
   province, is_current";

pub struct ChampionRow {
  pub year:          String,
  pub level:         String,
  pub category:      String,
  pub generation:    i64,
  pub rank:          i64,
  pub school_id:     String,
  pub school_name:   String,
  pub points:        f64,
  pub gold_medals:   i64,
  pub silver_medals: i64,
  pub bronze_medals: i64,
  pub total_medals:  i64,
  pub region:        Option<String>,
  pub province:      Option<String>,
  pub is_current:    bool,
}

impl ChampionRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      year:          row.get(0)?,
      level:         row.get(1)?,
      category:      row.get(2)?,
      generation:    row.get(3)?,
      rank:          row.get(4)?,
      school_id:     row.get(5)?,
      school_name:   row.get(6)?,
      points:        row.get(7)?,
      gold_medals:   row.get(8)?,
      silver_medals: row.get(9)?,
      bronze_medals: row.get(10)?,
      total_medals:  row.get(11)?,
      region:        row.get(12)?,
      province:      row.get(13)?,
      is_current:    row.get(14)?,
    })
  }

  pub fn from_champion(c: &OverallChampion) -> Self {
    Self {
      year:          c.year.clone(),
      level:         c.level.as_ref().to_owned(),
      category:      c.category.clone(),
      generation:    c.generation as i64,
      rank:          i64::from(c.rank),
      school_id:     encode_uuid(c.school.id),
      school_name:   c.school_name.clone(),
      points:        c.points,
      gold_medals:   i64::from(c.gold_medals),
      silver_medals: i64::from(c.silver_medals),
      bronze_medals: i64::from(c.bronze_medals),
      total_medals:  i64::from(c.total_medals),
      region:        c.region.clone(),
      province:      c.province.clone(),
      is_current:    c.is_current,
    }
  }

  pub fn into_champion(self) -> Result<OverallChampion> {
    Ok(OverallChampion {
      year:          self.year,
      level:         decode_enum("level", &self.level)?,
      category:      self.category,
      school:        EntityRef::school(decode_uuid(&self.school_id)?),
      school_name:   self.school_name,
      rank:          count(self.rank),
      points:        self.points,
      gold_medals:   count(self.gold_medals),
      silver_medals: count(self.silver_medals),
      bronze_medals: count(self.bronze_medals),
      total_medals:  count(self.total_medals),
      region:        self.region,
      province:      self.province,
      generation:    self.generation as u64,
      is_current:    self.is_current,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use podium_core::scope::Level;

  #[test]
  fn enums_use_lowercase_names() {
    assert_eq!(Level::Provincial.as_ref(), "provincial");
    assert_eq!(decode_enum::<Level>("level", "national").unwrap(), Level::National);
    assert!(matches!(
      decode_enum::<Level>("level", "barangay"),
      Err(Error::UnknownValue { column: "level", .. })
    ));
  }

  #[test]
  fn dates_are_iso() {
    let d = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
    assert_eq!(encode_date(d), "2025-02-14");
    assert_eq!(decode_date("2025-02-14").unwrap(), d);
  }
}
