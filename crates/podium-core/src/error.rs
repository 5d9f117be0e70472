//! Error types for `podium-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::entity::EntityRef;

#[derive(Debug, Error)]
pub enum Error {
  /// A result or fact is malformed or contradicts itself.
  #[error("invalid placement: {0}")]
  InvalidPlacement(String),

  #[error("invalid match: {0}")]
  InvalidMatch(String),

  /// The scope's period has been closed; the caller must reopen it or pass an
  /// explicit override.
  #[error("scope {0} is closed")]
  ScopeClosed(String),

  #[error("scope not found: {0}")]
  ScopeNotFound(String),

  /// A school sits in a roll-up pool without qualifying through a feeder scope.
  #[error("{name} ({entity}) did not qualify through any feeder scope")]
  UnqualifiedEntity { entity: EntityRef, name: String },

  /// A write would have retired or modified a finalised row.
  #[error("snapshot for scope {0} is final")]
  ImmutableSnapshot(String),

  /// The scope lock could not be acquired in time; retry later.
  #[error("recompute already in progress for scope {0}")]
  ConcurrentRecomputeConflict(String),

  #[error("result not found: {0}")]
  ResultNotFound(Uuid),

  #[error("result {0} is already superseded")]
  AlreadySuperseded(Uuid),

  #[error("result {0} is already retracted")]
  AlreadyRetracted(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Stable machine-readable name for the error kind.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::InvalidPlacement(_) => "invalid_placement",
      Self::InvalidMatch(_) => "invalid_match",
      Self::ScopeClosed(_) => "scope_closed",
      Self::ScopeNotFound(_) => "scope_not_found",
      Self::UnqualifiedEntity { .. } => "unqualified_entity",
      Self::ImmutableSnapshot(_) => "immutable_snapshot",
      Self::ConcurrentRecomputeConflict(_) => "concurrent_recompute_conflict",
      Self::ResultNotFound(_) => "result_not_found",
      Self::AlreadySuperseded(_) => "already_superseded",
      Self::AlreadyRetracted(_) => "already_retracted",
      Self::Serialization(_) => "serialization",
      Self::Storage(_) => "storage",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
