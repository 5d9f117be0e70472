//! [`SqliteStore`] — the SQLite implementation of [`StandingsStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use podium_core::{
  champion::OverallChampion,
  lifecycle::{ResolvedResult, Retraction, SnapshotReceipt, SnapshotWrite, Supersession},
  placement::{NewResult, VerifiedResult},
  ranking::{MatchResult, NewMatch, Ranking},
  scope::{Level, RankingScope, ScopeDefinition, ScopeKey},
  store::{ChampionQuery, StandingsStore},
  tally::MedalTally,
};

use crate::{
  Error, Result,
  encode::{
    CHAMPION_COLUMNS, ChampionRow, MATCH_COLUMNS, RANKING_COLUMNS, RESULT_COLUMNS, RawMatch,
    RawResult, RawScope, RankingRow, SCOPE_COLUMNS, TALLY_COLUMNS, TallyRow, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

/// Joins that resolve a result's lifecycle status; appended after
/// `RESULT_COLUMNS`.
const RESULT_FROM: &str = ", s.new_result_id, s.recorded_at, t.reason, t.recorded_at
   FROM results r
   LEFT JOIN result_supersessions s ON s.old_result_id = r.result_id
   LEFT JOIN result_retractions   t ON t.result_id     = r.result_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Podium standings store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn read_scope(&self, scope_key: String) -> Result<Option<ScopeDefinition>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SCOPE_COLUMNS} FROM scopes WHERE scope_key = ?1"),
              rusqlite::params![scope_key],
              RawScope::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawScope::into_definition).transpose()
  }

  async fn read_results(
    &self,
    sql_where: &'static str,
    params: Vec<Option<String>>,
  ) -> Result<Vec<ResolvedResult>> {
    let raws: Vec<RawResult> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {RESULT_COLUMNS}{RESULT_FROM} WHERE {sql_where}
           ORDER BY r.competition_date, r.recorded_at, r.result_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawResult::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawResult::into_resolved).collect()
  }

  async fn read_tallies(
    &self,
    scope: &ScopeKey,
    filter: &'static str,
  ) -> Result<Vec<MedalTally>> {
    let key = scope.canonical();
    let rows: Vec<TallyRow> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {TALLY_COLUMNS} FROM tallies WHERE scope_key = ?1 AND {filter}
           ORDER BY generation, entity_kind, rank, entity_name COLLATE NOCASE, entity_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key], TallyRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows.into_iter().map(|row| row.into_tally(scope)).collect()
  }

  async fn read_rankings(
    &self,
    scope: &RankingScope,
    filter: &'static str,
  ) -> Result<Vec<Ranking>> {
    let key = scope.scope.canonical();
    let kind = scope.kind.as_ref().to_owned();
    let rows: Vec<RankingRow> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {RANKING_COLUMNS} FROM rankings
           WHERE scope_key = ?1 AND entity_kind = ?2 AND {filter}
           ORDER BY generation, current_rank, entity_name COLLATE NOCASE, entity_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key, kind], RankingRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows.into_iter().map(|row| row.into_ranking(scope)).collect()
  }
}

// Filters for snapshot reads. `?1` is the scope key, `?2` the entity kind
// where applicable.
const TALLY_CURRENT: &str = "is_current = 1";
const TALLY_PREVIOUS: &str = "is_current = 0 AND generation =
   (SELECT MAX(generation) FROM tallies WHERE scope_key = ?1 AND is_current = 0)";
const RANKING_CURRENT: &str = "is_current = 1";
const RANKING_PREVIOUS: &str = "is_current = 0 AND generation =
   (SELECT MAX(generation) FROM rankings
    WHERE scope_key = ?1 AND entity_kind = ?2 AND is_current = 0)";
const ALL_GENERATIONS: &str = "1 = 1";

fn insert_result(tx: &rusqlite::Transaction<'_>, raw: &RawResult) -> rusqlite::Result<()> {
  tx.execute(
    "INSERT INTO results (
       result_id, participant_kind, participant_id, participant_name, school_id,
       school_name, region, province, sport_id, tournament_id, level, season,
       division, category, event, position, medal_type, competition_date,
       result_format, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
               ?16, ?17, ?18, ?19, ?20)",
    rusqlite::params![
      raw.result_id,
      raw.participant_kind,
      raw.participant_id,
      raw.participant_name,
      raw.school_id,
      raw.school_name,
      raw.region,
      raw.province,
      raw.sport_id,
      raw.tournament_id,
      raw.level,
      raw.season,
      raw.division,
      raw.category,
      raw.event,
      raw.position,
      raw.medal_type,
      raw.competition_date,
      raw.result_format,
      raw.recorded_at,
    ],
  )?;
  Ok(())
}

/// `(exists, superseded, retracted)` for a result id.
fn lifecycle_of(tx: &rusqlite::Transaction<'_>, id: &str) -> rusqlite::Result<(bool, bool, bool)> {
  let exists = tx
    .query_row(
      "SELECT 1 FROM results WHERE result_id = ?1",
      rusqlite::params![id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  let superseded = tx
    .query_row(
      "SELECT 1 FROM result_supersessions WHERE old_result_id = ?1",
      rusqlite::params![id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  let retracted = tx
    .query_row(
      "SELECT 1 FROM result_retractions WHERE result_id = ?1",
      rusqlite::params![id],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  Ok((exists, superseded, retracted))
}

fn check_active(id: Uuid, lifecycle: (bool, bool, bool)) -> Result<()> {
  match lifecycle {
    (false, ..) => Err(Error::ResultNotFound(id)),
    (true, true, _) => Err(Error::AlreadySuperseded(id)),
    (true, _, true) => Err(Error::AlreadyRetracted(id)),
    _ => Ok(()),
  }
}

fn insert_tally(
  tx: &rusqlite::Transaction<'_>,
  scope_key: &str,
  row: &TallyRow,
) -> rusqlite::Result<()> {
  tx.execute(
    &format!(
      "INSERT INTO tallies (scope_key, {TALLY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
         ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)"
    ),
    rusqlite::params![
      scope_key,
      row.entity_kind,
      row.entity_id,
      row.generation,
      row.entity_name,
      row.region,
      row.province,
      row.tally_date,
      row.period_start,
      row.period_end,
      row.gold_medals,
      row.silver_medals,
      row.bronze_medals,
      row.total_medals,
      row.gold_points,
      row.silver_points,
      row.bronze_points,
      row.total_points,
      row.rank,
      row.previous_rank,
      row.medal_breakdown,
      row.is_current,
      row.is_final,
    ],
  )?;
  Ok(())
}

fn insert_ranking(
  tx: &rusqlite::Transaction<'_>,
  scope_key: &str,
  row: &RankingRow,
) -> rusqlite::Result<()> {
  tx.execute(
    &format!(
      "INSERT INTO rankings (scope_key, {RANKING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6,
         ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23,
         ?24)"
    ),
    rusqlite::params![
      scope_key,
      row.entity_kind,
      row.entity_id,
      row.generation,
      row.entity_name,
      row.current_rank,
      row.previous_rank,
      row.rank_change,
      row.points,
      row.rating,
      row.gold_medals,
      row.silver_medals,
      row.bronze_medals,
      row.total_medals,
      row.matches_played,
      row.wins,
      row.losses,
      row.draws,
      row.win_percentage,
      row.points_for,
      row.points_against,
      row.point_differential,
      row.is_current,
      row.is_final,
    ],
  )?;
  Ok(())
}

// ─── StandingsStore impl ─────────────────────────────────────────────────────

impl StandingsStore for SqliteStore {
  type Error = Error;

  // ── Scopes ────────────────────────────────────────────────────────────────

  async fn define_scope(&self, definition: ScopeDefinition) -> Result<ScopeDefinition> {
    let raw = RawScope::from_definition(&definition)?;
    let scope_key = raw.scope_key.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO scopes ({SCOPE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (scope_key) DO UPDATE SET points_json = excluded.points_json"
          ),
          rusqlite::params![
            raw.scope_key,
            raw.season,
            raw.level,
            raw.sport_id,
            raw.tournament_id,
            raw.division,
            raw.category,
            raw.closed,
            raw.points_json,
            raw.defined_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    self
      .read_scope(scope_key.clone())
      .await?
      .ok_or_else(|| Error::Core(podium_core::Error::ScopeNotFound(scope_key)))
  }

  async fn get_scope<'a>(&'a self, key: &'a ScopeKey) -> Result<Option<ScopeDefinition>> {
    self.read_scope(key.canonical()).await
  }

  async fn list_scopes(&self, season: Option<String>) -> Result<Vec<ScopeDefinition>> {
    let season = season.map(|s| s.trim().to_owned());
    let raws: Vec<RawScope> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SCOPE_COLUMNS} FROM scopes
           WHERE (?1 IS NULL OR season = ?1)
           ORDER BY season, scope_key"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![season], RawScope::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawScope::into_definition).collect()
  }

  async fn set_scope_closed(
    &self,
    key: ScopeKey,
    closed: bool,
  ) -> Result<Option<ScopeDefinition>> {
    let scope_key = key.canonical();
    let key_for_call = scope_key.clone();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE scopes SET closed = ?2 WHERE scope_key = ?1",
          rusqlite::params![key_for_call, closed],
        )?;
        if changed > 0 && closed {
          tx.execute(
            "UPDATE tallies SET is_final = 1 WHERE scope_key = ?1 AND is_current = 1",
            rusqlite::params![key_for_call],
          )?;
          tx.execute(
            "UPDATE rankings SET is_final = 1 WHERE scope_key = ?1 AND is_current = 1",
            rusqlite::params![key_for_call],
          )?;
        }
        tx.commit()?;
        Ok(changed > 0)
      })
      .await?;

    if !updated {
      return Ok(None);
    }
    self.read_scope(scope_key).await
  }

  // ── Result ledger ─────────────────────────────────────────────────────────

  async fn record_result(&self, input: NewResult) -> Result<VerifiedResult> {
    let result = input.into_verified(Uuid::new_v4(), Utc::now());
    let raw = RawResult::from_result(&result);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_result(&tx, &raw)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(result)
  }

  async fn get_result(&self, id: Uuid) -> Result<Option<ResolvedResult>> {
    let mut found = self
      .read_results("r.result_id = ?1", vec![Some(encode_uuid(id))])
      .await?;
    Ok(found.pop())
  }

  async fn supersede_result(
    &self,
    old_id: Uuid,
    replacement: NewResult,
  ) -> Result<(Supersession, VerifiedResult)> {
    let now = Utc::now();
    let result = replacement.into_verified(Uuid::new_v4(), now);
    let supersession = Supersession {
      supersession_id: Uuid::new_v4(),
      old_result_id:   old_id,
      new_result_id:   result.result_id,
      recorded_at:     now,
    };

    let raw = RawResult::from_result(&result);
    let sup_id = encode_uuid(supersession.supersession_id);
    let old_str = encode_uuid(old_id);
    let new_str = raw.result_id.clone();
    let at_str = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = check_active(old_id, lifecycle_of(&tx, &old_str)?) {
          return Ok(Err(e));
        }
        insert_result(&tx, &raw)?;
        tx.execute(
          "INSERT INTO result_supersessions
             (supersession_id, old_result_id, new_result_id, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![sup_id, old_str, new_str, at_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok((supersession, result))
  }

  async fn retract_result(&self, id: Uuid, reason: Option<String>) -> Result<Retraction> {
    let retraction = Retraction {
      retraction_id: Uuid::new_v4(),
      result_id:     id,
      reason,
      recorded_at:   Utc::now(),
    };

    let ret_id = encode_uuid(retraction.retraction_id);
    let id_str = encode_uuid(id);
    let reason = retraction.reason.clone();
    let at_str = encode_dt(retraction.recorded_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Err(e) = check_active(id, lifecycle_of(&tx, &id_str)?) {
          return Ok(Err(e));
        }
        tx.execute(
          "INSERT INTO result_retractions (retraction_id, result_id, reason, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![ret_id, id_str, reason, at_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(retraction)
  }

  async fn list_results(&self, season: String, level: Option<Level>) -> Result<Vec<VerifiedResult>> {
    let resolved = self
      .read_results(
        "r.season = ?1 AND (?2 IS NULL OR r.level = ?2)
         AND s.old_result_id IS NULL AND t.result_id IS NULL",
        vec![
          Some(season.trim().to_owned()),
          level.map(|l| l.as_ref().to_owned()),
        ],
      )
      .await?;
    Ok(resolved.into_iter().map(|r| r.result).collect())
  }

  // ── Match ledger ──────────────────────────────────────────────────────────

  async fn record_match(&self, input: NewMatch) -> Result<MatchResult> {
    let recorded = input.into_recorded(Uuid::new_v4(), Utc::now());
    let raw = RawMatch::from_match(&recorded)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO matches ({MATCH_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
          ),
          rusqlite::params![
            raw.match_id,
            raw.sport_id,
            raw.tournament_id,
            raw.level,
            raw.season,
            raw.division,
            raw.category,
            raw.home_json,
            raw.away_json,
            raw.played_on,
            raw.recorded_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(recorded)
  }

  async fn list_matches(&self, season: String, level: Option<Level>) -> Result<Vec<MatchResult>> {
    let season = season.trim().to_owned();
    let level = level.map(|l| l.as_ref().to_owned());
    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MATCH_COLUMNS} FROM matches
           WHERE season = ?1 AND (?2 IS NULL OR level = ?2)
           ORDER BY played_on, recorded_at, match_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![season, level], RawMatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMatch::into_match).collect()
  }

  // ── Snapshots ─────────────────────────────────────────────────────────────

  async fn current_tallies<'a>(&'a self, scope: &'a ScopeKey) -> Result<Vec<MedalTally>> {
    self.read_tallies(scope, TALLY_CURRENT).await
  }

  async fn previous_tallies<'a>(&'a self, scope: &'a ScopeKey) -> Result<Vec<MedalTally>> {
    self.read_tallies(scope, TALLY_PREVIOUS).await
  }

  async fn tally_history<'a>(&'a self, scope: &'a ScopeKey) -> Result<Vec<MedalTally>> {
    self.read_tallies(scope, ALL_GENERATIONS).await
  }

  async fn current_rankings<'a>(&'a self, scope: &'a RankingScope) -> Result<Vec<Ranking>> {
    self.read_rankings(scope, RANKING_CURRENT).await
  }

  async fn previous_rankings<'a>(&'a self, scope: &'a RankingScope) -> Result<Vec<Ranking>> {
    self.read_rankings(scope, RANKING_PREVIOUS).await
  }

  async fn ranking_history<'a>(&'a self, scope: &'a RankingScope) -> Result<Vec<Ranking>> {
    self.read_rankings(scope, ALL_GENERATIONS).await
  }

  async fn swap_snapshot(&self, write: SnapshotWrite) -> Result<SnapshotReceipt> {
    let scope_key = write.scope.canonical();
    let is_final = write.is_final;
    let allow_final = write.allow_final;

    let mut tallies = write.tallies;
    if let Some(rows) = tallies.as_mut() {
      for tally in rows.iter_mut() {
        tally.reconcile();
        tally.scope = write.scope.clone();
        tally.is_current = true;
        tally.is_final = is_final;
      }
    }
    let mut rankings = write.rankings;
    for (_, rows) in rankings.iter_mut() {
      for ranking in rows.iter_mut() {
        ranking.is_current = true;
        ranking.is_final = is_final;
      }
    }

    let tally_rows = tallies
      .as_ref()
      .map(|rows| rows.iter().map(TallyRow::from_tally).collect::<Result<Vec<_>>>())
      .transpose()?;
    let ranking_rows: Vec<(String, Vec<RankingRow>)> = rankings
      .iter()
      .map(|(kind, rows)| {
        (
          kind.as_ref().to_owned(),
          rows.iter().map(RankingRow::from_ranking).collect(),
        )
      })
      .collect();

    let key = scope_key.clone();
    let generation = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let last: i64 = tx.query_row(
          "SELECT MAX(COALESCE((SELECT MAX(generation) FROM tallies  WHERE scope_key = ?1), 0),
                      COALESCE((SELECT MAX(generation) FROM rankings WHERE scope_key = ?1), 0))",
          rusqlite::params![key],
          |r| r.get(0),
        )?;
        let generation = last + 1;

        if !allow_final {
          let mut final_rows: i64 = 0;
          if tally_rows.is_some() {
            final_rows += tx.query_row(
              "SELECT COUNT(*) FROM tallies
               WHERE scope_key = ?1 AND is_current = 1 AND is_final = 1",
              rusqlite::params![key],
              |r| r.get::<_, i64>(0),
            )?;
          }
          for (kind, _) in &ranking_rows {
            final_rows += tx.query_row(
              "SELECT COUNT(*) FROM rankings
               WHERE scope_key = ?1 AND entity_kind = ?2 AND is_current = 1 AND is_final = 1",
              rusqlite::params![key, kind],
              |r| r.get::<_, i64>(0),
            )?;
          }
          if final_rows > 0 {
            return Ok(Err(Error::ImmutableSnapshot(key)));
          }
        }

        if let Some(mut rows) = tally_rows {
          tx.execute(
            "UPDATE tallies SET is_current = 0 WHERE scope_key = ?1 AND is_current = 1",
            rusqlite::params![key],
          )?;
          for row in rows.iter_mut() {
            row.generation = generation;
            insert_tally(&tx, &key, row)?;
          }
        }

        for (kind, mut rows) in ranking_rows {
          tx.execute(
            "UPDATE rankings SET is_current = 0
             WHERE scope_key = ?1 AND entity_kind = ?2 AND is_current = 1",
            rusqlite::params![key, kind],
          )?;
          for row in rows.iter_mut() {
            row.generation = generation;
            insert_ranking(&tx, &key, row)?;
          }
        }

        tx.commit()?;
        Ok(Ok(generation))
      })
      .await??;

    let generation = generation as u64;
    if let Some(rows) = tallies.as_mut() {
      for tally in rows.iter_mut() {
        tally.generation = generation;
      }
    }
    let rankings = rankings
      .into_iter()
      .flat_map(|(_, rows)| rows)
      .map(|mut ranking| {
        ranking.generation = generation;
        ranking
      })
      .collect();

    Ok(SnapshotReceipt { generation, tallies, rankings })
  }

  // ── Champions ─────────────────────────────────────────────────────────────

  async fn replace_champions(
    &self,
    year: String,
    level: Level,
    category: String,
    rows: Vec<OverallChampion>,
  ) -> Result<Vec<OverallChampion>> {
    let year = year.trim().to_owned();
    let category = category.trim().to_lowercase();
    let level_str = level.as_ref().to_owned();

    let mut rows = rows;
    for row in rows.iter_mut() {
      row.year = year.clone();
      row.level = level;
      row.category = category.clone();
      row.is_current = true;
    }
    let encoded: Vec<ChampionRow> = rows.iter().map(ChampionRow::from_champion).collect();

    let generation = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let last: i64 = tx.query_row(
          "SELECT COALESCE(MAX(generation), 0) FROM champions
           WHERE year = ?1 AND level = ?2 AND category = ?3",
          rusqlite::params![year, level_str, category],
          |r| r.get(0),
        )?;
        let generation = last + 1;

        tx.execute(
          "UPDATE champions SET is_current = 0
           WHERE year = ?1 AND level = ?2 AND category = ?3 AND is_current = 1",
          rusqlite::params![year, level_str, category],
        )?;
        for row in &encoded {
          tx.execute(
            &format!(
              "INSERT INTO champions ({CHAMPION_COLUMNS})
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            rusqlite::params![
              row.year,
              row.level,
              row.category,
              generation,
              row.rank,
              row.school_id,
              row.school_name,
              row.points,
              row.gold_medals,
              row.silver_medals,
              row.bronze_medals,
              row.total_medals,
              row.region,
              row.province,
              row.is_current,
            ],
          )?;
        }
        tx.commit()?;
        Ok(generation)
      })
      .await?;

    for row in rows.iter_mut() {
      row.generation = generation as u64;
    }
    Ok(rows)
  }

  async fn list_champions<'a>(&'a self, query: &'a ChampionQuery) -> Result<Vec<OverallChampion>> {
    let year = query.year.trim().to_owned();
    let level = query.level.map(|l| l.as_ref().to_owned());
    let category = query.category.as_deref().map(|c| c.trim().to_lowercase());
    let include_history = query.include_history;

    let rows: Vec<ChampionRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHAMPION_COLUMNS} FROM champions
           WHERE year = ?1
             AND (?2 IS NULL OR level = ?2)
             AND (?3 IS NULL OR category = ?3)
             AND (?4 OR is_current = 1)
           ORDER BY level, category, generation, rank"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![year, level, category, include_history],
            ChampionRow::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    rows.into_iter().map(ChampionRow::into_champion).collect()
  }
}
