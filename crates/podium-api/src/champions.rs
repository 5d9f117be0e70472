//! Handlers for `/champions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/champions/resolve` | Body: [`ResolveBody`] |
//! | `GET`  | `/champions` | `?year=` required; optional `level`, `category`, `include_history` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use podium_core::{
  Engine, Error as CoreError,
  champion::{ChampionPolicy, OverallChampion},
  scope::{Level, OVERALL_CATEGORY},
  store::{ChampionQuery, StandingsStore},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A champion row as served, with its display title.
#[derive(Debug, Serialize)]
pub struct ChampionView {
  #[serde(flatten)]
  pub champion: OverallChampion,
  pub title:    String,
}

impl From<OverallChampion> for ChampionView {
  fn from(champion: OverallChampion) -> Self {
    let title = champion.title();
    Self { champion, title }
  }
}

fn default_category() -> String { OVERALL_CATEGORY.to_owned() }

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub year:     String,
  pub level:    Level,
  #[serde(default = "default_category")]
  pub category: String,
  #[serde(default)]
  pub policy:   ChampionPolicy,
}

/// `POST /champions/resolve`
pub async fn resolve<S>(
  State(engine): State<Arc<Engine<S>>>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<Vec<ChampionView>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let champions = engine
    .resolve_champions(&body.year, body.level, &body.category, &body.policy)
    .await?;
  Ok(Json(champions.into_iter().map(ChampionView::from).collect()))
}

/// `GET /champions?year=<year>[&level=..][&category=..][&include_history=true]`
pub async fn list<S>(
  State(engine): State<Arc<Engine<S>>>,
  Query(query): Query<ChampionQuery>,
) -> Result<Json<Vec<ChampionView>>, ApiError>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  let champions = engine.list_champions(&query).await?;
  Ok(Json(champions.into_iter().map(ChampionView::from).collect()))
}
