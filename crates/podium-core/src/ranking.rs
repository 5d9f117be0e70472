//! Rankings — the ordered view of a [`RankingScope`].
//!
//! Order: total points, then total medals, then gold, silver and bronze, all
//! descending. Entities equal on all of those share a rank (`1, 2, 2, 4`).
//! Within a tie, output is ordered by name (case-insensitive) and then by
//! entity reference so the sort is a total order.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::EntityRef,
  scope::{Coordinates, Level, RankingScope},
  tally::MedalTally,
};

// ─── Comparator ──────────────────────────────────────────────────────────────

/// The fields a standing is ordered by.
#[derive(Debug, Clone, Copy)]
pub struct StandingKey<'a> {
  pub points:       f64,
  pub total_medals: u32,
  pub gold:         u32,
  pub silver:       u32,
  pub bronze:       u32,
  pub name:         &'a str,
  pub entity:       EntityRef,
}

impl StandingKey<'_> {
  /// Ordering on the rank-deciding fields only, best first.
  pub fn cmp_merit(&self, other: &Self) -> Ordering {
    other
      .points
      .total_cmp(&self.points)
      .then_with(|| other.total_medals.cmp(&self.total_medals))
      .then_with(|| other.gold.cmp(&self.gold))
      .then_with(|| other.silver.cmp(&self.silver))
      .then_with(|| other.bronze.cmp(&self.bronze))
  }

  /// Total order used for output.
  pub fn cmp_total(&self, other: &Self) -> Ordering {
    self.cmp_merit(other).then_with(|| {
      self
        .name
        .to_lowercase()
        .cmp(&other.name.to_lowercase())
        .then_with(|| self.entity.cmp(&other.entity))
    })
  }
}

/// Anything that can be placed in a ranked list.
pub trait Standing {
  fn standing_key(&self) -> StandingKey<'_>;
  fn set_rank(&mut self, rank: u32);
}

/// Sort `rows` into output order and assign standard competition ranks.
pub fn assign_ranks<T: Standing>(rows: &mut [T]) {
  rows.sort_by(|a, b| a.standing_key().cmp_total(&b.standing_key()));

  let mut rank = 0;
  for i in 0..rows.len() {
    let tied = i > 0
      && rows[i - 1]
        .standing_key()
        .cmp_merit(&rows[i].standing_key())
        .is_eq();
    if !tied {
      rank = i as u32 + 1;
    }
    rows[i].set_rank(rank);
  }
}

// ─── Matches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSide {
  pub entity: EntityRef,
  pub name:   String,
  pub score:  u32,
}

/// A head-to-head outcome as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
  pub match_id:      Uuid,
  pub recorded_at:   DateTime<Utc>,
  pub sport_id:      Uuid,
  pub tournament_id: Uuid,
  pub level:         Level,
  pub season:        String,
  pub division:      String,
  pub category:      String,
  pub home:          MatchSide,
  pub away:          MatchSide,
  pub played_on:     NaiveDate,
}

impl MatchResult {
  pub fn coordinates(&self) -> Coordinates {
    Coordinates {
      season:        self.season.clone(),
      level:         self.level,
      sport_id:      self.sport_id,
      tournament_id: self.tournament_id,
      division:      self.division.clone(),
      category:      self.category.clone(),
    }
  }
}

/// Input to [`crate::store::StandingsStore::record_match`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatch {
  pub sport_id:      Uuid,
  pub tournament_id: Uuid,
  pub level:         Level,
  pub season:        String,
  pub division:      String,
  pub category:      String,
  pub home:          MatchSide,
  pub away:          MatchSide,
  pub played_on:     NaiveDate,
}

impl NewMatch {
  pub fn validate(&self) -> Result<()> {
    if self.home.entity == self.away.entity {
      return Err(Error::InvalidMatch(format!(
        "{} cannot play against itself",
        self.home.entity
      )));
    }
    if self.home.entity.kind != self.away.entity.kind {
      return Err(Error::InvalidMatch(format!(
        "{} and {} are different kinds of entity",
        self.home.entity, self.away.entity
      )));
    }
    if self.home.name.trim().is_empty() || self.away.name.trim().is_empty() {
      return Err(Error::InvalidMatch("both sides need a name".into()));
    }
    Ok(())
  }

  pub fn into_recorded(self, match_id: Uuid, recorded_at: DateTime<Utc>) -> MatchResult {
    MatchResult {
      match_id,
      recorded_at,
      sport_id: self.sport_id,
      tournament_id: self.tournament_id,
      level: self.level,
      season: self.season,
      division: self.division,
      category: self.category,
      home: self.home,
      away: self.away,
      played_on: self.played_on,
    }
  }
}

// ─── Performance ─────────────────────────────────────────────────────────────

/// Win/loss record. Totals and percentages are derived, never stored as input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Performance {
  pub wins:           u32,
  pub losses:         u32,
  pub draws:          u32,
  pub points_for:     u64,
  pub points_against: u64,
}

impl Performance {
  pub fn record(&mut self, scored: u32, conceded: u32) {
    match scored.cmp(&conceded) {
      Ordering::Greater => self.wins += 1,
      Ordering::Less => self.losses += 1,
      Ordering::Equal => self.draws += 1,
    }
    self.points_for += u64::from(scored);
    self.points_against += u64::from(conceded);
  }

  pub fn matches_played(&self) -> u32 { self.wins + self.losses + self.draws }

  pub fn win_percentage(&self) -> f64 {
    match self.matches_played() {
      0 => 0.0,
      played => f64::from(self.wins) / f64::from(played) * 100.0,
    }
  }

  pub fn point_differential(&self) -> i64 {
    self.points_for as i64 - self.points_against as i64
  }
}

/// Fold the matches of one ranking scope into per-entity records.
pub fn tally_performance(
  matches: &[MatchResult],
  scope: &RankingScope,
) -> BTreeMap<EntityRef, (String, Performance)> {
  let mut out: BTreeMap<EntityRef, (String, Performance)> = BTreeMap::new();
  for m in matches {
    if !scope.scope.contains(&m.coordinates()) || m.home.entity.kind != scope.kind {
      continue;
    }
    for (side, other) in [(&m.home, &m.away), (&m.away, &m.home)] {
      let entry = out
        .entry(side.entity)
        .or_insert_with(|| (side.name.trim().to_owned(), Performance::default()));
      entry.1.record(side.score, other.score);
    }
  }
  out
}

// ─── Ranking ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
  pub entity:             EntityRef,
  pub entity_name:        String,
  pub scope:              RankingScope,
  pub current_rank:       u32,
  pub previous_rank:      Option<u32>,
  /// `previous_rank - current_rank`; positive means the entity moved up.
  pub rank_change:        i64,
  pub points:             f64,
  pub rating:             f64,
  pub gold_medals:        u32,
  pub silver_medals:      u32,
  pub bronze_medals:      u32,
  pub total_medals:       u32,
  pub matches_played:     u32,
  pub wins:               u32,
  pub losses:             u32,
  pub draws:              u32,
  pub win_percentage:     f64,
  pub points_for:         u64,
  pub points_against:     u64,
  pub point_differential: i64,
  pub generation:         u64,
  pub is_current:         bool,
  pub is_final:           bool,
}

impl Ranking {
  fn new(entity: EntityRef, entity_name: String, scope: RankingScope) -> Self {
    Self {
      entity,
      entity_name,
      scope,
      current_rank: 0,
      previous_rank: None,
      rank_change: 0,
      points: 0.0,
      rating: 0.0,
      gold_medals: 0,
      silver_medals: 0,
      bronze_medals: 0,
      total_medals: 0,
      matches_played: 0,
      wins: 0,
      losses: 0,
      draws: 0,
      win_percentage: 0.0,
      points_for: 0,
      points_against: 0,
      point_differential: 0,
      generation: 0,
      is_current: true,
      is_final: false,
    }
  }

  fn apply_tally(&mut self, tally: &MedalTally) {
    self.points = tally.total_points;
    self.gold_medals = tally.gold_medals;
    self.silver_medals = tally.silver_medals;
    self.bronze_medals = tally.bronze_medals;
    self.total_medals = tally.total_medals;
    self.rating = match tally.medal_breakdown.len() {
      0 => 0.0,
      n => tally.total_points / n as f64,
    };
  }

  fn apply_performance(&mut self, perf: &Performance) {
    self.wins = perf.wins;
    self.losses = perf.losses;
    self.draws = perf.draws;
    self.matches_played = perf.matches_played();
    self.win_percentage = perf.win_percentage();
    self.points_for = perf.points_for;
    self.points_against = perf.points_against;
    self.point_differential = perf.point_differential();
  }
}

impl Standing for Ranking {
  fn standing_key(&self) -> StandingKey<'_> {
    StandingKey {
      points:       self.points,
      total_medals: self.total_medals,
      gold:         self.gold_medals,
      silver:       self.silver_medals,
      bronze:       self.bronze_medals,
      name:         &self.entity_name,
      entity:       self.entity,
    }
  }

  fn set_rank(&mut self, rank: u32) { self.current_rank = rank; }
}

/// Build the next ranking generation for `scope`.
///
/// Every entity with a tally or a match record in the scope qualifies.
/// `previous` is the current generation being superseded; its ranks become
/// this generation's `previous_rank`.
pub fn build_rankings(
  scope: &RankingScope,
  tallies: &[MedalTally],
  performance: &BTreeMap<EntityRef, (String, Performance)>,
  previous: &[Ranking],
) -> Vec<Ranking> {
  let mut rows: BTreeMap<EntityRef, Ranking> = BTreeMap::new();

  for tally in tallies.iter().filter(|t| t.entity.kind == scope.kind) {
    rows
      .entry(tally.entity)
      .or_insert_with(|| Ranking::new(tally.entity, tally.entity_name.clone(), scope.clone()))
      .apply_tally(tally);
  }
  for (entity, (name, perf)) in performance {
    rows
      .entry(*entity)
      .or_insert_with(|| Ranking::new(*entity, name.clone(), scope.clone()))
      .apply_performance(perf);
  }

  let mut rows: Vec<Ranking> = rows.into_values().collect();
  assign_ranks(&mut rows);

  let prior: BTreeMap<EntityRef, u32> =
    previous.iter().map(|r| (r.entity, r.current_rank)).collect();
  for row in &mut rows {
    row.previous_rank = prior.get(&row.entity).copied();
    row.rank_change = row
      .previous_rank
      .map(|p| i64::from(p) - i64::from(row.current_rank))
      .unwrap_or(0);
  }
  rows
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{entity::EntityKind, scope::ScopeKey};

  fn scope() -> RankingScope {
    RankingScope::new(ScopeKey::new("2025", Level::Provincial), EntityKind::School)
  }

  fn row(name: &str, points: f64, gold: u32, silver: u32, bronze: u32) -> Ranking {
    let mut r = Ranking::new(EntityRef::school(Uuid::new_v4()), name.into(), scope());
    r.points = points;
    r.gold_medals = gold;
    r.silver_medals = silver;
    r.bronze_medals = bronze;
    r.total_medals = gold + silver + bronze;
    r
  }

  fn ranks(rows: &[Ranking]) -> Vec<(String, u32)> {
    rows.iter().map(|r| (r.entity_name.clone(), r.current_rank)).collect()
  }

  #[test]
  fn ties_share_rank_and_skip() {
    let mut rows = vec![
      row("Central", 6.0, 1, 1, 1),
      row("Baguio", 2.0, 0, 1, 0),
      row("Ateneo", 6.0, 1, 1, 1),
      row("Zamboanga", 9.0, 3, 0, 0),
    ];
    assign_ranks(&mut rows);
    assert_eq!(
      ranks(&rows),
      vec![
        ("Zamboanga".into(), 1),
        ("Ateneo".into(), 2),
        ("Central".into(), 2),
        ("Baguio".into(), 4),
      ]
    );
  }

  #[test]
  fn medals_break_point_ties() {
    // Same points: more medals first, then more golds.
    let mut rows = vec![
      row("A", 6.0, 2, 0, 0),
      row("B", 6.0, 0, 2, 2),
      row("C", 6.0, 1, 1, 1),
    ];
    assign_ranks(&mut rows);
    assert_eq!(
      ranks(&rows),
      vec![("B".into(), 1), ("C".into(), 2), ("A".into(), 3)]
    );
  }

  #[test]
  fn name_order_is_case_insensitive() {
    let mut rows = vec![row("beta", 1.0, 0, 0, 1), row("Alpha", 1.0, 0, 0, 1)];
    assign_ranks(&mut rows);
    assert_eq!(rows[0].entity_name, "Alpha");
    assert_eq!(rows[0].current_rank, rows[1].current_rank);
  }

  #[test]
  fn sorting_is_a_fixed_point() {
    let mut rows = vec![
      row("D", 4.0, 1, 0, 1),
      row("A", 4.0, 1, 0, 1),
      row("C", 5.0, 1, 1, 0),
      row("B", 0.0, 0, 0, 0),
    ];
    assign_ranks(&mut rows);
    let once = ranks(&rows);
    assign_ranks(&mut rows);
    assert_eq!(once, ranks(&rows));
  }

  #[test]
  fn performance_derives_totals() {
    let mut perf = Performance::default();
    perf.record(3, 1);
    perf.record(0, 2);
    perf.record(1, 1);
    perf.record(4, 0);
    assert_eq!(perf.matches_played(), 4);
    assert_eq!(perf.win_percentage(), 50.0);
    assert_eq!(perf.point_differential(), 4);
    assert_eq!(Performance::default().win_percentage(), 0.0);
  }

  #[test]
  fn rank_change_compares_against_previous_generation() {
    let s = scope();
    let e = EntityRef::school(Uuid::new_v4());
    let mut prev = Ranking::new(e, "E".into(), s.clone());
    prev.current_rank = 3;

    let mut perf = BTreeMap::new();
    perf.insert(e, ("E".to_owned(), Performance::default()));
    let rows = build_rankings(&s, &[], &perf, &[prev]);
    assert_eq!(rows[0].current_rank, 1);
    assert_eq!(rows[0].previous_rank, Some(3));
    assert_eq!(rows[0].rank_change, 2);
  }

  #[test]
  fn matches_of_other_kinds_are_ignored() {
    let team_a = EntityRef::team(Uuid::new_v4());
    let team_b = EntityRef::team(Uuid::new_v4());
    let m = NewMatch {
      sport_id:      Uuid::nil(),
      tournament_id: Uuid::nil(),
      level:         Level::Provincial,
      season:        "2025".into(),
      division:      "secondary".into(),
      category:      "boys".into(),
      home:          MatchSide { entity: team_a, name: "A".into(), score: 70 },
      away:          MatchSide { entity: team_b, name: "B".into(), score: 65 },
      played_on:     NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
    }
    .into_recorded(Uuid::new_v4(), Utc::now());

    assert!(tally_performance(std::slice::from_ref(&m), &scope()).is_empty());
    let teams = RankingScope::new(ScopeKey::new("2025", Level::Provincial), EntityKind::Team);
    let perf = tally_performance(&[m], &teams);
    assert_eq!(perf[&team_a].1.wins, 1);
    assert_eq!(perf[&team_b].1.losses, 1);
    assert_eq!(perf[&team_b].1.point_differential(), -5);
  }

  #[test]
  fn self_match_is_invalid() {
    let a = EntityRef::team(Uuid::new_v4());
    let m = NewMatch {
      sport_id:      Uuid::nil(),
      tournament_id: Uuid::nil(),
      level:         Level::Provincial,
      season:        "2025".into(),
      division:      "secondary".into(),
      category:      "boys".into(),
      home:          MatchSide { entity: a, name: "A".into(), score: 1 },
      away:          MatchSide { entity: a, name: "A".into(), score: 0 },
      played_on:     NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
    };
    assert!(matches!(m.validate(), Err(Error::InvalidMatch(_))));
  }
}
