//! HTTP surface: home, health, live SSE stream and stored history.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::get,
    Router,
};
use futures::stream::{self, Stream};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::ApiError;
use crate::history::get_history;
use crate::metrics::ProbeFactory;
use crate::store::RollingStore;
use crate::stream::{spawn_live_stream, StreamRegistry};
use crate::validate::parse_interval;

/// Shared server state.
pub struct AppState {
    pub store: RollingStore,
    pub probes: ProbeFactory,
    pub streams: StreamRegistry,
}

#[derive(Deserialize)]
struct LiveParams {
    interval: Option<String>,
}

#[derive(Deserialize)]
struct HistoryParams {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Serialize)]
struct HistoryResponse {
    #[serde(rename = "historical-metrics")]
    historical_metrics: Vec<String>,
}

async fn handle_home() -> Json<serde_json::Value> {
    info!("Home endpoint accessed.");
    Json(serde_json::json!({ "message": "Welcome to the System Metrics API" }))
}

async fn handle_health() -> Json<serde_json::Value> {
    info!("Health check endpoint accessed.");
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn handle_live_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LiveParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let interval = parse_interval(params.interval.as_deref())?;

    let rx = spawn_live_stream(
        state.store.clone(),
        state.streams.clone(),
        (state.probes)(),
        interval,
    );

    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok(Event::default().data(event.payload())), rx))
    });
    Ok(Sse::new(events))
}

async fn handle_historical_metrics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let historical_metrics = get_history(
        &state.store,
        params.start.as_deref(),
        params.end.as_deref(),
    )
    .await
    .map_err(|err| {
        error!("Error fetching historical metrics: {}", err);
        ApiError::History(err)
    })?;
    Ok(Json(HistoryResponse { historical_metrics }))
}

/// Build the axum router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health))
        .route("/realmetrics", get(handle_live_metrics))
        .route("/historical-metrics", get(handle_historical_metrics))
        // The dashboard is served from another origin.
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
