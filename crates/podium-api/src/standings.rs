//! Handlers for tallies, rankings and recomputes.
//!
//! Read endpoints take the scope as query parameters (see
//! [`ScopeParams`](crate::scopes::ScopeParams)).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tally` | `entity_kind` and `entity_id` required; 404 if none |
//! | `GET`  | `/tallies` | Optional `include_history` |
//! | `GET`  | `/tallies/previous` | The generation before the current one |
//! | `GET`  | `/rankings` | `kind` required; optional `include_history` |
//! | `GET`  | `/rankings/previous` | `kind` required |
//! | `POST` | `/recompute` | Body: [`RecomputeBody`] |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use podium_core::{
  Engine, Error as CoreError,
  entity::{EntityKind, EntityRef},
  lifecycle::ScopeStandings,
  ranking::Ranking,
  scope::{RankingScope, ScopeKey},
  store::StandingsStore,
  tally::MedalTally,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, scopes::ScopeParams};

// ─── Tallies ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EntityParams {
  pub entity_kind: EntityKind,
  pub entity_id:   Uuid,
}

/// `GET /tally?<scope>&entity_kind=<kind>&entity_id=<id>`
pub async fn get_tally<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(scope): Query<ScopeParams>,
  Query(params): Query<EntityParams>,
) -> Result<Json<MedalTally>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let entity = EntityRef::new(params.entity_kind, params.entity_id);
  let key = scope.into_key();
  let tally = engine
    .get_tally(&key, entity)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no tally for {entity} in {key}")))?;
  Ok(Json(tally))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
  #[serde(default)]
  pub include_history: bool,
}

/// `GET /tallies?<scope>[&include_history=true]`
pub async fn list_tallies<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(scope): Query<ScopeParams>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<MedalTally>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let tallies = engine
    .list_tallies(&scope.into_key(), params.include_history)
    .await?;
  Ok(Json(tallies))
}

/// `GET /tallies/previous?<scope>`
pub async fn previous_tallies<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(scope): Query<ScopeParams>,
) -> Result<Json<Vec<MedalTally>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Ok(Json(engine.previous_tallies(&scope.into_key()).await?))
}

// ─── Rankings ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RankingParams {
  pub kind:            EntityKind,
  #[serde(default)]
  pub include_history: bool,
}

/// `GET /rankings?<scope>&kind=<kind>[&include_history=true]`
pub async fn list_rankings<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(scope): Query<ScopeParams>,
  Query(params): Query<RankingParams>,
) -> Result<Json<Vec<Ranking>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let scope = RankingScope::new(scope.into_key(), params.kind);
  Ok(Json(engine.list_rankings(&scope, params.include_history).await?))
}

/// `GET /rankings/previous?<scope>&kind=<kind>`
pub async fn previous_rankings<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(scope): Query<ScopeParams>,
  Query(params): Query<RankingParams>,
) -> Result<Json<Vec<Ranking>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let scope = RankingScope::new(scope.into_key(), params.kind);
  Ok(Json(engine.previous_rankings(&scope).await?))
}

// ─── Recompute ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecomputeBody {
  pub scope:           ScopeKey,
  /// Restrict the response to one ranking universe.
  pub kind:            Option<EntityKind>,
  /// Recompute a closed scope anyway.
  #[serde(default, rename = "override")]
  pub override_closed: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RecomputeResponse {
  Rankings(Vec<Ranking>),
  Standings(ScopeStandings),
}

/// `POST /recompute` — body: `{"scope": {...}, "kind": "school", "override": false}`
pub async fn recompute<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<RecomputeBody>,
) -> Result<Json<RecomputeResponse>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let response = match body.kind {
    Some(kind) => {
      let scope = RankingScope::new(body.scope, kind);
      RecomputeResponse::Rankings(engine.recompute(&scope, body.override_closed).await?)
    }
    None => RecomputeResponse::Standings(
      engine
        .refresh_scope(&body.scope, body.override_closed)
        .await?,
    ),
  };
  Ok(Json(response))
}
