//! Error type for `podium-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] podium_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum discriminant is not recognised.
  #[error("unknown {column} value: {value:?}")]
  UnknownValue { column: &'static str, value: String },

  #[error("result not found: {0}")]
  ResultNotFound(uuid::Uuid),

  #[error("result {0} is already superseded")]
  AlreadySuperseded(uuid::Uuid),

  #[error("result {0} is already retracted")]
  AlreadyRetracted(uuid::Uuid),

  /// A swap tried to retire final rows without permission.
  #[error("snapshot for scope {0} is final")]
  ImmutableSnapshot(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for podium_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(e) => e,
      Error::ResultNotFound(id) => Self::ResultNotFound(id),
      Error::AlreadySuperseded(id) => Self::AlreadySuperseded(id),
      Error::AlreadyRetracted(id) => Self::AlreadyRetracted(id),
      Error::ImmutableSnapshot(scope) => Self::ImmutableSnapshot(scope),
      other => Self::Storage(Box::new(other)),
    }
  }
}
