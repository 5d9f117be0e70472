//! JSON REST API for Podium.
//!
//! Exposes an axum [`Router`] over an [`Engine`] backed by any
//! [`podium_core::store::StandingsStore`]. Auth, TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", podium_api::api_router(engine.clone()))
//! ```

pub mod champions;
pub mod error;
pub mod results;
pub mod scopes;
pub mod standings;
pub mod years;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use podium_core::{Engine, Error as CoreError, store::StandingsStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: StandingsStore + 'static,
  CoreError: From<S::Error>,
{
  Router::new()
    // Scopes
    .route("/scopes", get(scopes::list::<S>).post(scopes::define::<S>))
    .route("/scopes/close", post(scopes::close::<S>))
    .route("/scopes/reopen", post(scopes::reopen::<S>))
    // Ledger
    .route("/results", get(results::list::<S>).post(results::record::<S>))
    .route("/results/{id}", get(results::get_one::<S>))
    .route("/results/{id}/correct", post(results::correct::<S>))
    .route("/results/{id}/retract", post(results::retract::<S>))
    .route("/matches", post(results::record_match::<S>))
    // Standings
    .route("/recompute", post(standings::recompute::<S>))
    .route("/tally", get(standings::get_tally::<S>))
    .route("/tallies", get(standings::list_tallies::<S>))
    .route("/tallies/previous", get(standings::previous_tallies::<S>))
    .route("/rankings", get(standings::list_rankings::<S>))
    .route("/rankings/previous", get(standings::previous_rankings::<S>))
    // Champions
    .route("/champions", get(champions::list::<S>))
    .route("/champions/resolve", post(champions::resolve::<S>))
    // Years
    .route("/years/{year}/recompute", post(years::recompute::<S>))
    .route("/years/{year}/statistics", get(years::statistics::<S>))
    .with_state(engine)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
  };
  use podium_core::{Engine, EngineConfig};
  use podium_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::api_router;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(Engine::new(Arc::new(store), EngineConfig::default())))
  }

  async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(body) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn scope_key() -> Value { json!({ "season": "2025", "level": "provincial" }) }

  fn result_body(school: Uuid, name: &str, medal: &str, position: u32, event: &str) -> Value {
    json!({
      "participant": { "kind": "school", "id": school },
      "participant_name": name,
      "sport_id": Uuid::from_u128(5),
      "tournament_id": Uuid::from_u128(7),
      "level": "provincial",
      "season": "2025",
      "division": "secondary",
      "category": "boys",
      "event": event,
      "position": position,
      "medal_type": medal,
      "competition_date": "2025-03-01",
    })
  }

  #[tokio::test]
  async fn recorded_results_show_up_in_rankings() {
    let app = app().await;
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

    let (status, _) = send(&app, "POST", "/scopes", Some(json!({ "key": scope_key() }))).await;
    assert_eq!(status, StatusCode::CREATED);

    for body in [
      result_body(a, "School A", "gold", 1, "100m"),
      result_body(b, "School B", "silver", 2, "100m"),
      result_body(a, "School A", "bronze", 3, "200m"),
    ] {
      let (status, value) = send(&app, "POST", "/results", Some(body)).await;
      assert_eq!(status, StatusCode::CREATED, "{value}");
      assert_eq!(value["refreshed"].as_array().unwrap().len(), 1);
    }

    let (status, rankings) =
      send(&app, "GET", "/rankings?season=2025&level=provincial&kind=school", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rankings.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["entity_name"], "School A");
    assert_eq!(rows[0]["current_rank"], 1);
    assert_eq!(rows[0]["points"], 4.0);
    assert_eq!(rows[1]["current_rank"], 2);

    let uri = format!("/tally?season=2025&level=provincial&entity_kind=school&entity_id={b}");
    let (status, tally) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tally["silver_medals"], 1);
    assert_eq!(tally["total_points"], 2.0);
  }

  #[tokio::test]
  async fn missing_tally_is_404() {
    let app = app().await;
    let uri = format!(
      "/tally?season=2025&level=provincial&entity_kind=school&entity_id={}",
      Uuid::new_v4()
    );
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
  }

  #[tokio::test]
  async fn contradictory_medal_is_422() {
    let app = app().await;
    let body = result_body(Uuid::new_v4(), "School A", "gold", 2, "100m");
    let (status, value) = send(&app, "POST", "/results", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(value["kind"], "invalid_placement");
  }

  #[tokio::test]
  async fn closed_scope_reports_finalized_period() {
    let app = app().await;
    send(&app, "POST", "/scopes", Some(json!({ "key": scope_key() }))).await;
    let (status, closed) = send(&app, "POST", "/scopes/close", Some(scope_key())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["closed"], true);

    let body = result_body(Uuid::new_v4(), "School A", "gold", 1, "100m");
    let (status, value) = send(&app, "POST", "/results", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(value["kind"], "scope_closed");
    assert_eq!(value["error"], "this period has been finalized");

    let (status, _) =
      send(&app, "POST", "/recompute", Some(json!({ "scope": scope_key() }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
      &app,
      "POST",
      "/recompute",
      Some(json!({ "scope": scope_key(), "kind": "school", "override": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn recompute_of_undefined_scope_is_404() {
    let app = app().await;
    let (status, body) =
      send(&app, "POST", "/recompute", Some(json!({ "scope": scope_key() }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "scope_not_found");
  }

  #[tokio::test]
  async fn retraction_flows_through() {
    let app = app().await;
    send(&app, "POST", "/scopes", Some(json!({ "key": scope_key() }))).await;
    let school = Uuid::new_v4();
    let (_, recorded) =
      send(&app, "POST", "/results", Some(result_body(school, "A", "gold", 1, "100m"))).await;
    let id = recorded["record"]["result_id"].as_str().unwrap().to_owned();

    let (status, _) = send(
      &app,
      "POST",
      &format!("/results/{id}/retract"),
      Some(json!({ "reason": "disqualified" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, resolved) = send(&app, "GET", &format!("/results/{id}"), None).await;
    assert_eq!(resolved["status"]["status"], "retracted");

    let (status, again) = send(
      &app,
      "POST",
      &format!("/results/{id}/retract"),
      Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["kind"], "already_retracted");

    let (_, tallies) = send(&app, "GET", "/tallies?season=2025&level=provincial", None).await;
    assert!(tallies.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn champions_resolve_with_titles() {
    let app = app().await;
    let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    for (i, (medal, position)) in [("gold", 1), ("silver", 2), ("bronze", 3), ("none", 4)]
      .into_iter()
      .enumerate()
    {
      let body = result_body(ids[i], &format!("School {i}"), medal, position, "100m");
      let (status, _) = send(&app, "POST", "/results", Some(body)).await;
      assert_eq!(status, StatusCode::CREATED);
    }

    let (status, champions) = send(
      &app,
      "POST",
      "/champions/resolve",
      Some(json!({ "year": "2025", "level": "provincial" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{champions}");
    let rows = champions.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["title"], "Champion");
    assert_eq!(rows[1]["title"], "1st Runner-up");
    assert_eq!(rows[2]["title"], "2nd Runner-up");
    assert_eq!(rows[0]["category"], "overall");

    let (status, listed) =
      send(&app, "GET", "/champions?year=2025&level=provincial", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 3);
  }

  #[tokio::test]
  async fn year_statistics_and_bulk_recompute() {
    let app = app().await;
    send(&app, "POST", "/scopes", Some(json!({ "key": scope_key() }))).await;
    let body = result_body(Uuid::new_v4(), "School A", "gold", 1, "100m");
    send(&app, "POST", "/results", Some(body)).await;

    let (status, summary) = send(&app, "POST", "/years/2025/recompute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary[0]["skipped"], false);
    assert_eq!(summary[0]["tallies"], 1);

    let (status, stats) = send(&app, "GET", "/years/2025/statistics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_schools"], 1);
    assert_eq!(stats["gold_medals"], 1);
  }
}
