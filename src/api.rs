use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::DateTime;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::analytics::{self, Insights};
use crate::error::TransportError;
use crate::orchestrator::RefreshOrchestrator;
use crate::snapshot::{EnrichedItem, Snapshot};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<RefreshOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<RefreshOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<RefreshOrchestrator> {
        &self.orchestrator
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v0/stories", get(stories))
        .route("/v0/insights", get(insights))
        .route("/v0/trending", get(trending))
        .route("/v0/correlation", get(correlation))
        .route("/ws/stories", get(ws_stories))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Upstream failure surfaced to HTTP callers as 502.
pub struct ApiError(TransportError);

impl From<TransportError> for ApiError {
    fn from(e: TransportError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(target: "api", error = %self.0, kind = self.0.kind(), "snapshot unavailable");
        let body = Json(json!({ "error": self.0.to_string() }));
        (StatusCode::BAD_GATEWAY, body).into_response()
    }
}

#[derive(Debug, serde::Deserialize)]
struct SizeQuery {
    #[serde(default)]
    n: Option<usize>,
}

/// Wire shape of one story.
#[derive(Debug, serde::Serialize)]
pub struct StoryOut {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    /// RFC 3339; the epoch when the upstream item had no time.
    pub time: String,
    pub score: u64,
    pub descendants: u64,
    pub by: String,
    pub domain: String,
    pub keywords: Vec<String>,
}

impl From<&EnrichedItem> for StoryOut {
    fn from(it: &EnrichedItem) -> Self {
        Self {
            id: it.raw.id,
            title: it.raw.title.clone(),
            url: it.raw.url.clone(),
            time: DateTime::from_timestamp(it.raw.time, 0)
                .unwrap_or_default()
                .to_rfc3339(),
            score: it.raw.score,
            descendants: it.raw.descendants,
            by: it.raw.by.clone(),
            domain: it.domain.clone(),
            keywords: it.keywords.clone(),
        }
    }
}

fn stories_out(snapshot: &Snapshot) -> Vec<StoryOut> {
    snapshot.items().iter().map(StoryOut::from).collect()
}

async fn stories(State(state): State<AppState>) -> Result<Json<Vec<StoryOut>>, ApiError> {
    let snapshot = state.orchestrator.get_snapshot().await?;
    Ok(Json(stories_out(&snapshot)))
}

async fn insights(
    State(state): State<AppState>,
    Query(q): Query<SizeQuery>,
) -> Result<Json<Insights>, ApiError> {
    let snapshot = state.orchestrator.get_snapshot().await?;
    Ok(Json(state.orchestrator.insights(&snapshot, q.n)))
}

#[derive(serde::Serialize)]
struct TrendingOut {
    trending: Vec<(String, usize)>,
}

async fn trending(
    State(state): State<AppState>,
    Query(q): Query<SizeQuery>,
) -> Result<Json<TrendingOut>, ApiError> {
    let snapshot = state.orchestrator.get_snapshot().await?;
    Ok(Json(TrendingOut {
        trending: state.orchestrator.trending(&snapshot, q.n),
    }))
}

#[derive(serde::Serialize)]
struct PairsOut {
    pairs: Vec<(u64, u64)>,
}

async fn correlation(State(state): State<AppState>) -> Result<Json<PairsOut>, ApiError> {
    let snapshot = state.orchestrator.get_snapshot().await?;
    Ok(Json(PairsOut {
        pairs: analytics::score_comment_pairs(&snapshot),
    }))
}

async fn ws_stories(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stories_socket(socket, state))
}

/// Answer every client message with the current stories.
async fn stories_socket(mut socket: WebSocket, state: AppState) {
    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(target: "api", error = %e, "websocket receive failed");
                break;
            }
        };
        match msg {
            Message::Close(_) => break,
            Message::Text(_) | Message::Binary(_) => {
                let payload = match state.orchestrator.get_snapshot().await {
                    Ok(snapshot) => json!({ "stories": stories_out(&snapshot) }),
                    Err(e) => json!({ "error": e.to_string() }),
                };
                if socket
                    .send(Message::Text(payload.to_string().into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            _ => {}
        }
    }
}
