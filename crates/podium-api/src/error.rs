//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use podium_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Engine(#[from] CoreError),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Engine(e) => match e {
        CoreError::InvalidPlacement(_)
        | CoreError::InvalidMatch(_)
        | CoreError::UnqualifiedEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::ScopeClosed(_)
        | CoreError::ImmutableSnapshot(_)
        | CoreError::AlreadySuperseded(_)
        | CoreError::AlreadyRetracted(_) => StatusCode::CONFLICT,
        CoreError::ConcurrentRecomputeConflict(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::ScopeNotFound(_) | CoreError::ResultNotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Serialization(_) | CoreError::Storage(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      ApiError::NotFound(_) => "not_found",
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Engine(e) => e.kind(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::NotFound(m) | ApiError::BadRequest(m) => m.clone(),
      ApiError::Engine(CoreError::ScopeClosed(_) | CoreError::ImmutableSnapshot(_)) => {
        "this period has been finalized".to_owned()
      }
      ApiError::Engine(e) => e.to_string(),
    };
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": message, "kind": self.kind() }))).into_response()
  }
}
