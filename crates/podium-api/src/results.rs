//! Handlers for `/results` and `/matches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/results` | `?season=` required; optional `level` |
//! | `GET`  | `/results/:id` | Result with its lifecycle status |
//! | `POST` | `/results` | Body: `NewResult`; returns 201 |
//! | `POST` | `/results/:id/correct` | Body: the corrected `NewResult` |
//! | `POST` | `/results/:id/retract` | Body: `{"reason":"..."}` (optional) |
//! | `POST` | `/matches` | Body: `NewMatch`; returns 201 |
//!
//! Every write answers with the stored record and the canonical keys of the
//! scopes it refreshed.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use podium_core::{
  Engine, Error as CoreError,
  engine::Ingested,
  lifecycle::ResolvedResult,
  placement::{NewResult, VerifiedResult},
  ranking::NewMatch,
  scope::Level,
  store::StandingsStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Reads ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub season: String,
  pub level:  Option<Level>,
}

/// `GET /results?season=<year>[&level=<level>]` — active results only.
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<VerifiedResult>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let results = engine
    .store()
    .list_results(params.season, params.level)
    .await
    .map_err(CoreError::from)?;
  Ok(Json(results))
}

/// `GET /results/:id`
pub async fn get_one<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResolvedResult>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let result = engine
    .store()
    .get_result(id)
    .await
    .map_err(CoreError::from)?
    .ok_or_else(|| ApiError::NotFound(format!("result {id} not found")))?;
  Ok(Json(result))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /results` — returns 201.
pub async fn record<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<NewResult>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let ingested = engine.record_result(body).await?;
  Ok((StatusCode::CREATED, Json(ingested)))
}

/// `POST /results/:id/correct` — body is the replacement result.
pub async fn correct<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<NewResult>,
) -> Result<Json<Ingested<VerifiedResult>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.correct_result(id, body).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct RetractBody {
  pub reason: Option<String>,
}

/// `POST /results/:id/retract`
pub async fn retract<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RetractBody>,
) -> Result<Json<Ingested<VerifiedResult>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.retract_result(id, body.reason).await?))
}

/// `POST /matches` — returns 201.
pub async fn record_match<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<NewMatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let ingested = engine.record_match(body).await?;
  Ok((StatusCode::CREATED, Json(ingested)))
}
