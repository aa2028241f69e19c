//! HTTP surface: routes, handlers and error mapping

pub mod chat;
pub mod sleep;
pub mod workouts;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::db::AppState;
use crate::llm::LlmError;
use crate::sleep::SleepError;
use crate::workouts::WorkoutError;

/// ---------------------------------------------------------------------------
/// Router
/// ---------------------------------------------------------------------------

pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/api/chat", post(chat::chat))
    .route(
      "/api/workouts",
      get(workouts::list_workouts).post(workouts::create_workout),
    )
    .route("/api/workouts/draft", get(workouts::new_workout_draft))
    .route(
      "/api/workouts/:id",
      get(workouts::get_workout)
        .put(workouts::update_workout)
        .delete(workouts::delete_workout),
    )
    .route("/api/exercises", get(workouts::list_exercises))
    .route("/api/sleep", get(sleep::get_sleep_scores))
    .route("/api/sleep/summary", get(sleep::get_sleep_summary))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[derive(Serialize)]
struct Health {
  status: &'static str,
}

async fn health() -> Json<Health> {
  Json(Health { status: "ok" })
}

/// ---------------------------------------------------------------------------
/// Error Mapping
/// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApiError {
  Validation(String),
  NotFound(String),
  Internal(String),
  Upstream(String),
  Timeout,
}

impl From<WorkoutError> for ApiError {
  fn from(e: WorkoutError) -> Self {
    match e {
      WorkoutError::Validation(msg) => ApiError::Validation(msg),
      WorkoutError::NotFound(_) => ApiError::NotFound(e.to_string()),
      WorkoutError::Database(_) => ApiError::Internal(e.to_string()),
    }
  }
}

impl From<SleepError> for ApiError {
  fn from(e: SleepError) -> Self {
    ApiError::Internal(e.to_string())
  }
}

impl From<LlmError> for ApiError {
  fn from(e: LlmError) -> Self {
    ApiError::Upstream(e.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind, message) = match self {
      ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg),
      ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
      ApiError::Internal(msg) => {
        error!(error = %msg, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
      }
      ApiError::Upstream(msg) => {
        warn!(error = %msg, "Model request failed");
        (StatusCode::BAD_GATEWAY, "upstream_error", msg)
      }
      ApiError::Timeout => (
        StatusCode::GATEWAY_TIMEOUT,
        "timeout",
        "Request exceeded the maximum duration".to_string(),
      ),
    };

    let body = serde_json::json!({
      "error": {
        "message": message,
        "type": kind,
      }
    });
    (status, Json(body)).into_response()
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
