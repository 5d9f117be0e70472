//! Handlers for `/scopes` endpoints, and the scope query parameters shared by
//! the read endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/scopes` | Optional `?season=` |
//! | `POST` | `/scopes` | Body: [`DefineBody`]; returns 201 |
//! | `POST` | `/scopes/close` | Body: a scope key |
//! | `POST` | `/scopes/reopen` | Body: a scope key |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use podium_core::{
  Engine, Error as CoreError,
  placement::PointsTable,
  scope::{Level, ScopeDefinition, ScopeKey},
  store::StandingsStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Shared query parameters ─────────────────────────────────────────────────

/// A scope key spelled out as query parameters. Must not be flattened into
/// another query struct; `serde_urlencoded` cannot parse typed fields there.
#[derive(Debug, Deserialize)]
pub struct ScopeParams {
  pub season:        String,
  pub level:         Level,
  pub sport_id:      Option<Uuid>,
  pub tournament_id: Option<Uuid>,
  pub division:      Option<String>,
  pub category:      Option<String>,
}

impl ScopeParams {
  pub fn into_key(self) -> ScopeKey {
    ScopeKey {
      season:        self.season,
      level:         self.level,
      sport_id:      self.sport_id,
      tournament_id: self.tournament_id,
      division:      self.division,
      category:      self.category,
    }
    .normalized()
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub season: Option<String>,
}

/// `GET /scopes[?season=<year>]`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScopeDefinition>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.list_scopes(params.season).await?))
}

// ─── Define ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DefineBody {
  pub key:    ScopeKey,
  /// Medal weighting for this scope; the server default applies when absent.
  pub points: Option<PointsTable>,
}

/// `POST /scopes` — returns 201 + the stored definition.
pub async fn define<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<DefineBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let mut definition = ScopeDefinition::open(body.key);
  definition.points = body.points;
  let stored = engine.define_scope(definition).await?;
  Ok((StatusCode::CREATED, Json(stored)))
}

// ─── Period ──────────────────────────────────────────────────────────────────

/// `POST /scopes/close` — body: a scope key.
pub async fn close<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(key): Json<ScopeKey>,
) -> Result<Json<ScopeDefinition>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.close_scope(key).await?))
}

/// `POST /scopes/reopen` — body: a scope key.
pub async fn reopen<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(key): Json<ScopeKey>,
) -> Result<Json<ScopeDefinition>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.reopen_scope(key).await?))
}
