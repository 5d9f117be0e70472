//! Handlers for `/years` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use podium_core::{
  Engine, Error as CoreError, engine::RecomputeSummary, stats::YearStatistics,
  store::StandingsStore,
};

use crate::error::ApiError;

/// `POST /years/:year/recompute` — every open scope of the year.
pub async fn recompute<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(year): Path<String>,
) -> Result<Json<Vec<RecomputeSummary>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.recompute_year(&year).await?))
}

/// `GET /years/:year/statistics`
pub async fn statistics<S>(
  State(engine): State<Arc<Engine<S>>>,
  Path(year): Path<String>,
) -> Result<Json<YearStatistics>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.year_statistics(&year).await?))
}
