use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::db::AppState;
use crate::models::{Exercise, Workout, WorkoutDraft};
use crate::workouts::{self, DeleteOutcome};

/// ---------------------------------------------------------------------------
/// Read
/// ---------------------------------------------------------------------------

pub async fn list_workouts(
  State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Workout>>, ApiError> {
  Ok(Json(workouts::list(&state.db).await?))
}

pub async fn get_workout(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
) -> Result<Json<Workout>, ApiError> {
  Ok(Json(workouts::get(&state.db, id).await?))
}

/// Starting point for the workout builder
pub async fn new_workout_draft() -> Json<WorkoutDraft> {
  Json(WorkoutDraft::new())
}

pub async fn list_exercises(
  State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Exercise>>, ApiError> {
  Ok(Json(workouts::list_exercises(&state.db).await?))
}

/// ---------------------------------------------------------------------------
/// Save
/// ---------------------------------------------------------------------------

// Incomplete workouts are blocked here, before the store is involved, so
// create and update follow the same rule.

pub async fn create_workout(
  State(state): State<Arc<AppState>>,
  Json(draft): Json<WorkoutDraft>,
) -> Result<(StatusCode, Json<Workout>), ApiError> {
  draft.validate().map_err(ApiError::Validation)?;
  let workout = workouts::create(&state.db, &draft).await?;
  Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn update_workout(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
  Json(draft): Json<WorkoutDraft>,
) -> Result<Json<Workout>, ApiError> {
  draft.validate().map_err(ApiError::Validation)?;
  Ok(Json(workouts::update(&state.db, id, &draft).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
  #[serde(default)]
  pub reset_identity: bool,
}

pub async fn delete_workout(
  State(state): State<Arc<AppState>>,
  Path(id): Path<i64>,
  Query(params): Query<DeleteParams>,
) -> Result<Json<DeleteOutcome>, ApiError> {
  Ok(Json(
    workouts::delete(&state.db, id, params.reset_identity).await?,
  ))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
