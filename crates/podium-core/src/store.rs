//! The `StandingsStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `podium-store-sqlite`).
//! The [`Engine`](crate::Engine) and the API layer depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  champion::OverallChampion,
  lifecycle::{ResolvedResult, Retraction, SnapshotReceipt, SnapshotWrite, Supersession},
  placement::{NewResult, VerifiedResult},
  ranking::{MatchResult, NewMatch, Ranking},
  scope::{Level, RankingScope, ScopeDefinition, ScopeKey},
  tally::MedalTally,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`StandingsStore::list_champions`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChampionQuery {
  pub year:            String,
  pub level:           Option<Level>,
  /// Category label as stored on the champion rows (`"overall"` included).
  pub category:        Option<String>,
  /// Also return superseded champion sets.
  #[serde(default)]
  pub include_history: bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Podium storage backend.
///
/// The result and match ledgers are append-only; corrections are lifecycle
/// events. Tallies, rankings and champions are versioned: writes append a new
/// generation and retire the previous one without deleting it.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait StandingsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Scopes ────────────────────────────────────────────────────────────

  /// Create or replace the definition of a scope. The closed flag of an
  /// existing definition is kept; use [`Self::set_scope_closed`] to change it.
  fn define_scope(
    &self,
    definition: ScopeDefinition,
  ) -> impl Future<Output = Result<ScopeDefinition, Self::Error>> + Send + '_;

  fn get_scope<'a>(
    &'a self,
    key: &'a ScopeKey,
  ) -> impl Future<Output = Result<Option<ScopeDefinition>, Self::Error>> + Send + 'a;

  /// List definitions, optionally restricted to one season.
  fn list_scopes(
    &self,
    season: Option<String>,
  ) -> impl Future<Output = Result<Vec<ScopeDefinition>, Self::Error>> + Send + '_;

  /// Open or close a scope. Closing also marks the scope's current tally
  /// and ranking rows final. Returns `None` if the scope is not defined.
  fn set_scope_closed(
    &self,
    key: ScopeKey,
    closed: bool,
  ) -> impl Future<Output = Result<Option<ScopeDefinition>, Self::Error>> + Send + '_;

  // ── Result ledger ─────────────────────────────────────────────────────

  /// Record a verified result. `result_id` and `recorded_at` are set by the
  /// store.
  fn record_result(
    &self,
    input: NewResult,
  ) -> impl Future<Output = Result<VerifiedResult, Self::Error>> + Send + '_;

  fn get_result(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ResolvedResult>, Self::Error>> + Send + '_;

  /// Replace a result with a corrected one.
  ///
  /// Returns an error if `old_id` is unknown, already superseded or retracted.
  fn supersede_result(
    &self,
    old_id: Uuid,
    replacement: NewResult,
  ) -> impl Future<Output = Result<(Supersession, VerifiedResult), Self::Error>> + Send + '_;

  /// Withdraw a result with no replacement.
  fn retract_result(
    &self,
    id: Uuid,
    reason: Option<String>,
  ) -> impl Future<Output = Result<Retraction, Self::Error>> + Send + '_;

  /// Active results of a season, optionally restricted to one level.
  fn list_results(
    &self,
    season: String,
    level: Option<Level>,
  ) -> impl Future<Output = Result<Vec<VerifiedResult>, Self::Error>> + Send + '_;

  // ── Match ledger ──────────────────────────────────────────────────────

  fn record_match(
    &self,
    input: NewMatch,
  ) -> impl Future<Output = Result<MatchResult, Self::Error>> + Send + '_;

  fn list_matches(
    &self,
    season: String,
    level: Option<Level>,
  ) -> impl Future<Output = Result<Vec<MatchResult>, Self::Error>> + Send + '_;

  // ── Snapshots ─────────────────────────────────────────────────────────

  fn current_tallies<'a>(
    &'a self,
    scope: &'a ScopeKey,
  ) -> impl Future<Output = Result<Vec<MedalTally>, Self::Error>> + Send + 'a;

  /// The generation immediately before the current one.
  fn previous_tallies<'a>(
    &'a self,
    scope: &'a ScopeKey,
  ) -> impl Future<Output = Result<Vec<MedalTally>, Self::Error>> + Send + 'a;

  /// Every generation, oldest first.
  fn tally_history<'a>(
    &'a self,
    scope: &'a ScopeKey,
  ) -> impl Future<Output = Result<Vec<MedalTally>, Self::Error>> + Send + 'a;

  fn current_rankings<'a>(
    &'a self,
    scope: &'a RankingScope,
  ) -> impl Future<Output = Result<Vec<Ranking>, Self::Error>> + Send + 'a;

  fn previous_rankings<'a>(
    &'a self,
    scope: &'a RankingScope,
  ) -> impl Future<Output = Result<Vec<Ranking>, Self::Error>> + Send + 'a;

  fn ranking_history<'a>(
    &'a self,
    scope: &'a RankingScope,
  ) -> impl Future<Output = Result<Vec<Ranking>, Self::Error>> + Send + 'a;

  /// Atomically retire the current generation(s) named by `write` and make
  /// its rows current. Either every row flips or none does.
  ///
  /// Fails with `ImmutableSnapshot` if a row to be retired is final and
  /// `write.allow_final` is false.
  fn swap_snapshot(
    &self,
    write: SnapshotWrite,
  ) -> impl Future<Output = Result<SnapshotReceipt, Self::Error>> + Send + '_;

  // ── Champions ─────────────────────────────────────────────────────────

  /// Atomically replace the current champion set of `(year, level, category)`.
  fn replace_champions(
    &self,
    year: String,
    level: Level,
    category: String,
    rows: Vec<OverallChampion>,
  ) -> impl Future<Output = Result<Vec<OverallChampion>, Self::Error>> + Send + '_;

  fn list_champions<'a>(
    &'a self,
    query: &'a ChampionQuery,
  ) -> impl Future<Output = Result<Vec<OverallChampion>, Self::Error>> + Send + 'a;
}
