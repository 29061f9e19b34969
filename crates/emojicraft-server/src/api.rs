//! HTTP handlers over the game engine.

use crate::checkpoint::CheckpointManager;
use crate::{record_counter, record_gauge};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use emojicraft_core::{Direction, Error};
use emojicraft_world::{GameEngine, MoveOutcome, StartOutcome, WorldView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GameEngine>,
    pub checkpoints: Arc<CheckpointManager>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/world", get(get_world))
        .route("/move", post(move_player))
        .route("/start", post(start_round))
        .route("/restart", post(restart_round))
        .route("/save", post(save))
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_world(State(state): State<AppState>) -> Json<WorldView> {
    Json(state.engine.query_world())
}

#[derive(Deserialize)]
pub struct MoveParams {
    dir: String,
}

pub async fn move_player(
    State(state): State<AppState>,
    Query(params): Query<MoveParams>,
) -> Result<Json<MoveOutcome>, ApiError> {
    let direction: Direction = params.dir.parse()?;
    let outcome = state.engine.move_player(direction);

    record_counter!("moves", 1u64, item_collected = outcome.collected);
    if outcome.collected {
        record_gauge!("score", outcome.score);
    }
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct StartParams {
    duration: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    outcome: StartOutcome,
    time_remaining: u32,
}

pub async fn start_round(
    State(state): State<AppState>,
    Query(params): Query<StartParams>,
) -> Json<StartResponse> {
    let outcome = state.engine.start_round(params.duration);
    let time_remaining = state.engine.query_world().remaining_secs;
    if outcome == StartOutcome::Started {
        record_counter!("rounds_started", 1u64);
    }
    Json(StartResponse {
        outcome,
        time_remaining,
    })
}

pub async fn restart_round(State(state): State<AppState>) -> Json<WorldView> {
    state.engine.restart_round();
    record_counter!("rounds_started", 1u64);
    Json(state.engine.query_world())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    saved_at: i64,
}

pub async fn save(State(state): State<AppState>) -> Result<Json<SaveResponse>, ApiError> {
    let snapshot = state.checkpoints.save_now().await?;
    info!(saved_at = snapshot.saved_at, "Saved on request");
    Ok(Json(SaveResponse {
        saved_at: snapshot.saved_at,
    }))
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, message).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(_) | Error::OutOfBounds(_) | Error::Occupied(_) => {
                warn!(error = %err, "Rejected request");
                ApiError::BadRequest(err.to_string())
            }
            Error::NotFound(_) => ApiError::NotFound(err.to_string()),
            _ => {
                error!(error = %err, "Request failed");
                ApiError::Internal(err.to_string())
            }
        }
    }
}
