//! [`Engine`] — orchestrates ingest, recompute and champion resolution over a
//! [`StandingsStore`].
//!
//! Every recompute of a scope runs under that scope's lock: facts are derived
//! from the active result ledger, folded into tallies, ranked, and committed
//! as one snapshot swap.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  champion::{self, ChampionPolicy, DEFAULT_TOP_N, OverallChampion},
  entity::{EntityKind, EntityRef},
  lifecycle::{ResultStatus, ScopeStandings, SnapshotWrite},
  lock::ScopeLocks,
  placement::{self, NewResult, PlacementFact, PointsTable, VerifiedResult},
  ranking::{self, MatchResult, NewMatch, Ranking},
  scope::{Coordinates, Level, RankingScope, ScopeDefinition, ScopeKey},
  stats::{self, YearStatistics},
  store::{ChampionQuery, StandingsStore},
  tally::{self, MedalTally},
};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Weighting used by scopes that do not define their own.
  pub default_points: PointsTable,
  /// How long a recompute waits for a busy scope before giving up.
  pub lock_timeout:   Duration,
  pub champion_top_n: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      default_points: PointsTable::default(),
      lock_timeout:   Duration::from_secs(5),
      champion_top_n: DEFAULT_TOP_N,
    }
  }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// A ledger write and the scopes recomputed because of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingested<T> {
  pub record:    T,
  /// Canonical keys of the refreshed scopes.
  pub refreshed: Vec<String>,
}

/// Outcome of one scope in a bulk recompute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeSummary {
  pub scope:    ScopeKey,
  pub tallies:  usize,
  pub rankings: usize,
  /// The scope is closed and was left untouched.
  pub skipped:  bool,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct Engine<S> {
  store:  Arc<S>,
  config: EngineConfig,
  locks:  ScopeLocks,
}

impl<S> Engine<S>
where
  S: StandingsStore,
  Error: From<S::Error>,
{
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
    let locks = ScopeLocks::new(config.lock_timeout);
    Self { store, config, locks }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &EngineConfig { &self.config }

  // ── Scopes ────────────────────────────────────────────────────────────

  pub async fn define_scope(&self, mut definition: ScopeDefinition) -> Result<ScopeDefinition> {
    definition.key = definition.key.normalized();
    if let Some(points) = &definition.points {
      points.validate()?;
    }
    let stored = self.store.define_scope(definition).await?;
    info!(scope = %stored.key, "scope defined");
    Ok(stored)
  }

  pub async fn list_scopes(&self, season: Option<String>) -> Result<Vec<ScopeDefinition>> {
    Ok(self.store.list_scopes(season).await?)
  }

  /// Close a scope's period and finalise its current rows.
  pub async fn close_scope(&self, key: ScopeKey) -> Result<ScopeDefinition> {
    self.set_closed(key, true).await
  }

  /// Reopen a closed period. Rows finalised at close stay final; the next
  /// recompute supersedes them with a new generation.
  pub async fn reopen_scope(&self, key: ScopeKey) -> Result<ScopeDefinition> {
    self.set_closed(key, false).await
  }

  async fn set_closed(&self, key: ScopeKey, closed: bool) -> Result<ScopeDefinition> {
    let key = key.normalized();
    let canonical = key.canonical();
    let _guard = self.locks.acquire(&canonical).await?;
    let definition = self
      .store
      .set_scope_closed(key, closed)
      .await?
      .ok_or_else(|| Error::ScopeNotFound(canonical.clone()))?;
    info!(scope = %canonical, closed, "scope period updated");
    Ok(definition)
  }

  async fn definition_or_open(&self, key: &ScopeKey) -> Result<ScopeDefinition> {
    match self.store.get_scope(key).await? {
      Some(definition) => Ok(definition),
      None => Ok(self.store.define_scope(ScopeDefinition::open(key.clone())).await?),
    }
  }

  /// Defined scopes containing any of `at`. Fails with `ScopeClosed` if one of
  /// them is closed, so that closed periods accept no new facts.
  async fn open_scopes_containing(&self, at: &[Coordinates]) -> Result<Vec<ScopeDefinition>> {
    let seasons: BTreeSet<String> = at.iter().map(|c| c.season.trim().to_owned()).collect();
    let mut out = Vec::new();
    for season in seasons {
      for definition in self.store.list_scopes(Some(season)).await? {
        if !at.iter().any(|c| definition.key.contains(c)) {
          continue;
        }
        if definition.closed {
          warn!(scope = %definition.key, "rejected write into closed scope");
          return Err(Error::ScopeClosed(definition.key.canonical()));
        }
        out.push(definition);
      }
    }
    Ok(out)
  }

  // ── Result ledger ─────────────────────────────────────────────────────

  /// Validate a result the way it will be normalised at recompute time, and
  /// check it against the active results of the same event.
  async fn validate_result(&self, input: &NewResult, replacing: Option<Uuid>) -> Result<()> {
    let candidate = input.clone().into_verified(Uuid::nil(), chrono::Utc::now());
    let points = &self.config.default_points;
    let fact = placement::normalize(&candidate, points)?;

    let mut same_event: Vec<PlacementFact> = Vec::new();
    for existing in self
      .store
      .list_results(candidate.season.clone(), Some(candidate.level))
      .await?
    {
      if Some(existing.result_id) == replacing
        || existing.tournament_id != candidate.tournament_id
        || existing.sport_id != candidate.sport_id
        || existing.event.trim() != fact.event
      {
        continue;
      }
      same_event.push(placement::normalize(&existing, points)?);
    }
    same_event.push(fact);
    placement::check_event_positions(&same_event)
  }

  /// Record a verified result and recompute every open scope containing it.
  pub async fn record_result(&self, input: NewResult) -> Result<Ingested<VerifiedResult>> {
    self.validate_result(&input, None).await?;
    let at = input.clone().into_verified(Uuid::nil(), chrono::Utc::now()).coordinates();
    let scopes = self.open_scopes_containing(std::slice::from_ref(&at)).await?;

    let result = self.store.record_result(input).await?;
    info!(result_id = %result.result_id, participant = %result.participant, "result recorded");

    let refreshed = self.refresh_all(&scopes).await?;
    Ok(Ingested { record: result, refreshed })
  }

  /// Replace a result with a corrected version.
  pub async fn correct_result(
    &self,
    old_id: Uuid,
    replacement: NewResult,
  ) -> Result<Ingested<VerifiedResult>> {
    let old = self.active_result(old_id).await?;
    self.validate_result(&replacement, Some(old_id)).await?;
    let new_at = replacement.clone().into_verified(Uuid::nil(), chrono::Utc::now()).coordinates();
    let scopes = self.open_scopes_containing(&[old.coordinates(), new_at]).await?;

    let (_supersession, result) = self.store.supersede_result(old_id, replacement).await?;
    info!(old = %old_id, new = %result.result_id, "result corrected");

    let refreshed = self.refresh_all(&scopes).await?;
    Ok(Ingested { record: result, refreshed })
  }

  /// Withdraw a result.
  pub async fn retract_result(
    &self,
    id: Uuid,
    reason: Option<String>,
  ) -> Result<Ingested<VerifiedResult>> {
    let old = self.active_result(id).await?;
    let scopes = self.open_scopes_containing(&[old.coordinates()]).await?;

    self.store.retract_result(id, reason).await?;
    info!(result_id = %id, "result retracted");

    let refreshed = self.refresh_all(&scopes).await?;
    Ok(Ingested { record: old, refreshed })
  }

  async fn active_result(&self, id: Uuid) -> Result<VerifiedResult> {
    let resolved = self
      .store
      .get_result(id)
      .await?
      .ok_or(Error::ResultNotFound(id))?;
    match resolved.status {
      ResultStatus::Active => Ok(resolved.result),
      ResultStatus::Superseded { .. } => Err(Error::AlreadySuperseded(id)),
      ResultStatus::Retracted { .. } => Err(Error::AlreadyRetracted(id)),
    }
  }

  pub async fn record_match(&self, input: NewMatch) -> Result<Ingested<MatchResult>> {
    input.validate()?;
    let at = Coordinates {
      season:        input.season.clone(),
      level:         input.level,
      sport_id:      input.sport_id,
      tournament_id: input.tournament_id,
      division:      input.division.clone(),
      category:      input.category.clone(),
    };
    let scopes = self.open_scopes_containing(&[at]).await?;

    let recorded = self.store.record_match(input).await?;
    info!(match_id = %recorded.match_id, "match recorded");

    let refreshed = self.refresh_all(&scopes).await?;
    Ok(Ingested { record: recorded, refreshed })
  }

  async fn refresh_all(&self, scopes: &[ScopeDefinition]) -> Result<Vec<String>> {
    let mut refreshed = Vec::with_capacity(scopes.len());
    for definition in scopes {
      let canonical = definition.key.canonical();
      let _guard = self.locks.acquire(&canonical).await?;
      // Re-read under the lock; the definition may have changed meanwhile.
      let current = self
        .store
        .get_scope(&definition.key)
        .await?
        .ok_or_else(|| Error::ScopeNotFound(canonical.clone()))?;
      if current.closed {
        warn!(scope = %canonical, "scope closed before refresh; left untouched");
        continue;
      }
      self.refresh_locked(&current, false).await?;
      refreshed.push(canonical);
    }
    Ok(refreshed)
  }

  // ── Recompute ─────────────────────────────────────────────────────────

  async fn facts_for(&self, key: &ScopeKey, points: &PointsTable) -> Result<Vec<PlacementFact>> {
    let facts = self
      .store
      .list_results(key.season.clone(), Some(key.level))
      .await?
      .iter()
      .filter(|r| key.contains(&r.coordinates()))
      .map(|r| placement::normalize(r, points))
      .collect::<Result<Vec<_>>>()?;
    placement::check_event_positions(&facts)?;
    Ok(facts)
  }

  /// Rebuild tallies and rankings of one scope. The caller holds its lock.
  async fn refresh_locked(
    &self,
    definition: &ScopeDefinition,
    override_closed: bool,
  ) -> Result<ScopeStandings> {
    let key = &definition.key;
    if definition.closed && !override_closed {
      return Err(Error::ScopeClosed(key.canonical()));
    }

    let points = definition.points.unwrap_or(self.config.default_points);
    let facts = self.facts_for(key, &points).await?;

    let mut next = tally::aggregate(&facts, key)?;
    let current = self.store.current_tallies(key).await?;
    tally::carry_forward(&mut next, &current);
    let changed = !tally::unchanged(&next, &current);
    let basis = if changed { &next } else { &current };

    let matches = self
      .store
      .list_matches(key.season.clone(), Some(key.level))
      .await?;
    let mut rankings = Vec::new();
    for kind in EntityKind::ALL {
      let scope = RankingScope::new(key.clone(), kind);
      let performance = ranking::tally_performance(&matches, &scope);
      let previous = self.store.current_rankings(&scope).await?;
      let rows = ranking::build_rankings(&scope, basis, &performance, &previous);
      if !rows.is_empty() || !previous.is_empty() {
        rankings.push((kind, rows));
      }
    }

    let receipt = self
      .store
      .swap_snapshot(SnapshotWrite {
        scope: key.clone(),
        tallies: changed.then_some(next),
        rankings,
        is_final: definition.closed,
        allow_final: override_closed || !definition.closed,
      })
      .await?;

    if receipt.rankings.is_empty() && facts.is_empty() {
      debug!(scope = %key, "scope has no qualifying entities");
    }
    info!(
      scope = %key,
      generation = receipt.generation,
      tallies_changed = changed,
      rankings = receipt.rankings.len(),
      "scope recomputed"
    );

    Ok(ScopeStandings {
      tallies:  receipt.tallies.unwrap_or(current),
      rankings: receipt.rankings,
    })
  }

  /// Fold `facts` into the tallies of `scope`.
  ///
  /// Re-applying an unchanged fact set is a no-op that returns the current
  /// rows untouched. Fails with `ScopeClosed` on a closed scope unless
  /// `override_closed` is set.
  pub async fn apply(
    &self,
    facts: &[PlacementFact],
    scope: &ScopeKey,
    override_closed: bool,
  ) -> Result<Vec<MedalTally>> {
    let key = scope.clone().normalized();
    let _guard = self.locks.acquire(&key.canonical()).await?;
    let definition = self.definition_or_open(&key).await?;
    if definition.closed && !override_closed {
      warn!(scope = %key, "rejected apply into closed scope");
      return Err(Error::ScopeClosed(key.canonical()));
    }

    placement::check_event_positions(facts)?;
    let mut next = tally::aggregate(facts, &key)?;
    let current = self.store.current_tallies(&key).await?;
    tally::carry_forward(&mut next, &current);
    if tally::unchanged(&next, &current) {
      debug!(scope = %key, "tallies unchanged");
      return Ok(current);
    }

    let receipt = self
      .store
      .swap_snapshot(SnapshotWrite {
        scope: key.clone(),
        tallies: Some(next),
        rankings: Vec::new(),
        is_final: definition.closed,
        allow_final: override_closed || !definition.closed,
      })
      .await?;
    info!(scope = %key, generation = receipt.generation, "tallies applied");
    Ok(receipt.tallies.unwrap_or_default())
  }

  /// Recompute one ranking universe. An empty scope yields an empty vector.
  pub async fn recompute(&self, scope: &RankingScope, override_closed: bool) -> Result<Vec<Ranking>> {
    let standings = self.refresh_scope(&scope.scope, override_closed).await?;
    Ok(
      standings
        .rankings
        .into_iter()
        .filter(|r| r.entity.kind == scope.kind)
        .collect(),
    )
  }

  /// Recompute tallies and every ranking universe of a defined scope.
  pub async fn refresh_scope(&self, scope: &ScopeKey, override_closed: bool) -> Result<ScopeStandings> {
    let key = scope.clone().normalized();
    let canonical = key.canonical();
    let _guard = self.locks.acquire(&canonical).await?;
    let definition = self
      .store
      .get_scope(&key)
      .await?
      .ok_or(Error::ScopeNotFound(canonical))?;
    self.refresh_locked(&definition, override_closed).await
  }

  /// Recompute every open scope of a season. Closed scopes are skipped.
  pub async fn recompute_year(&self, year: &str) -> Result<Vec<RecomputeSummary>> {
    let mut out = Vec::new();
    for definition in self.store.list_scopes(Some(year.trim().to_owned())).await? {
      if definition.closed {
        debug!(scope = %definition.key, "skipping closed scope");
        out.push(RecomputeSummary {
          scope:    definition.key,
          tallies:  0,
          rankings: 0,
          skipped:  true,
        });
        continue;
      }
      let standings = self.refresh_scope(&definition.key, false).await?;
      out.push(RecomputeSummary {
        scope:    definition.key,
        tallies:  standings.tallies.len(),
        rankings: standings.rankings.len(),
        skipped:  false,
      });
    }
    info!(year, scopes = out.len(), "year recomputed");
    Ok(out)
  }

  // ── Champions ─────────────────────────────────────────────────────────

  /// Current tallies of `key`, refreshed first unless the scope is closed.
  async fn fresh_tallies(&self, key: &ScopeKey) -> Result<Vec<MedalTally>> {
    let _guard = self.locks.acquire(&key.canonical()).await?;
    let definition = self.definition_or_open(key).await?;
    if definition.closed {
      return Ok(self.store.current_tallies(key).await?);
    }
    Ok(self.refresh_locked(&definition, false).await?.tallies)
  }

  /// Select and persist the overall champions of `(year, level, category)`.
  pub async fn resolve_champions(
    &self,
    year: &str,
    level: Level,
    category: &str,
    policy: &ChampionPolicy,
  ) -> Result<Vec<OverallChampion>> {
    let key = ScopeKey::champion(year, level, category);
    let _outer = self
      .locks
      .acquire(&format!("champions:{}", key.canonical()))
      .await?;

    let candidates = self.fresh_tallies(&key).await?;

    let qualified = match &policy.qualification {
      Some(rule) => {
        let mut set = BTreeSet::new();
        for feeder in &rule.feeders {
          let feeder = feeder.clone().normalized();
          let tallies = self.fresh_tallies(&feeder).await?;
          set.extend(champion::qualified_schools(&tallies, rule.top_n));
        }
        Some(set)
      }
      None => None,
    };

    let top_n = policy.top_n.unwrap_or(self.config.champion_top_n);
    let rows = champion::select_champions(
      &key,
      &candidates,
      &policy.pool_additions,
      qualified.as_ref(),
      top_n,
    )
    .inspect_err(|e| warn!(scope = %key, error = %e, "champion resolution rejected"))?;

    let stored = self
      .store
      .replace_champions(key.season.clone(), level, key.category_label().to_owned(), rows)
      .await?;
    info!(scope = %key, champions = stored.len(), "champions resolved");
    Ok(stored)
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  pub async fn get_tally(&self, scope: &ScopeKey, entity: EntityRef) -> Result<Option<MedalTally>> {
    let key = scope.clone().normalized();
    Ok(
      self
        .store
        .current_tallies(&key)
        .await?
        .into_iter()
        .find(|t| t.entity == entity),
    )
  }

  pub async fn list_tallies(&self, scope: &ScopeKey, include_history: bool) -> Result<Vec<MedalTally>> {
    let key = scope.clone().normalized();
    if include_history {
      Ok(self.store.tally_history(&key).await?)
    } else {
      Ok(self.store.current_tallies(&key).await?)
    }
  }

  pub async fn previous_tallies(&self, scope: &ScopeKey) -> Result<Vec<MedalTally>> {
    let key = scope.clone().normalized();
    Ok(self.store.previous_tallies(&key).await?)
  }

  pub async fn list_rankings(&self, scope: &RankingScope, include_history: bool) -> Result<Vec<Ranking>> {
    let scope = RankingScope::new(scope.scope.clone().normalized(), scope.kind);
    if include_history {
      Ok(self.store.ranking_history(&scope).await?)
    } else {
      Ok(self.store.current_rankings(&scope).await?)
    }
  }

  pub async fn previous_rankings(&self, scope: &RankingScope) -> Result<Vec<Ranking>> {
    let scope = RankingScope::new(scope.scope.clone().normalized(), scope.kind);
    Ok(self.store.previous_rankings(&scope).await?)
  }

  pub async fn list_champions(&self, query: &ChampionQuery) -> Result<Vec<OverallChampion>> {
    Ok(self.store.list_champions(query).await?)
  }

  /// Participation figures for a year, derived from the active ledger.
  pub async fn year_statistics(&self, year: &str) -> Result<YearStatistics> {
    let year = year.trim();
    let facts = self
      .store
      .list_results(year.to_owned(), None)
      .await?
      .iter()
      .map(|r| placement::normalize(r, &self.config.default_points))
      .collect::<Result<Vec<_>>>()?;
    Ok(stats::year_statistics(year, &facts))
  }
}
