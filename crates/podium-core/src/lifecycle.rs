//! Lifecycle events for ledger rows, and snapshot generations.
//!
//! Verified results are immutable. Corrections and withdrawals are tracked in
//! two append-only event tables and resolved at query time. Tallies and
//! rankings are versioned by generation: a recompute appends a new generation
//! and flips `is_current`, nothing is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  entity::EntityKind, placement::VerifiedResult, ranking::Ranking, scope::ScopeKey,
  tally::MedalTally,
};

// ─── Ledger events ───────────────────────────────────────────────────────────

/// Records that a result has been replaced by a corrected version.
/// A result can be superseded at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supersession {
  pub supersession_id: Uuid,
  pub old_result_id:   Uuid,
  pub new_result_id:   Uuid,
  pub recorded_at:     DateTime<Utc>,
}

/// Records that a result has been withdrawn with no replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retraction {
  pub retraction_id: Uuid,
  pub result_id:     Uuid,
  pub reason:        Option<String>,
  pub recorded_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultStatus {
  Active,
  Superseded { by: Uuid, at: DateTime<Utc> },
  Retracted { reason: Option<String>, at: DateTime<Utc> },
}

impl ResultStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }
}

/// A result bundled with its current lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedResult {
  pub result: VerifiedResult,
  pub status: ResultStatus,
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// One atomic generation swap for a scope.
#[derive(Debug, Clone)]
pub struct SnapshotWrite {
  pub scope:       ScopeKey,
  /// New tally generation, or `None` to leave current tallies in place.
  pub tallies:     Option<Vec<MedalTally>>,
  /// New ranking generations, one per listed entity kind. A kind listed with
  /// no rows retires its current rankings.
  pub rankings:    Vec<(EntityKind, Vec<Ranking>)>,
  /// Whether rows written by this swap are final.
  pub is_final:    bool,
  /// Permit retiring rows that are already final.
  pub allow_final: bool,
}

/// What a committed [`SnapshotWrite`] persisted.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReceipt {
  pub generation: u64,
  pub tallies:    Option<Vec<MedalTally>>,
  pub rankings:   Vec<Ranking>,
}

/// The current tallies and rankings of one scope after a refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeStandings {
  pub tallies:  Vec<MedalTally>,
  pub rankings: Vec<Ranking>,
}
