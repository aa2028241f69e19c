//! Workout store
//!
//! Thin adapter between the workout builder's shape and the `workouts` table.
//! The step list is written and read as one JSON column; there is no
//! per-step query or partial update. Every save re-numbers steps `1..N`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{Exercise, Workout, WorkoutDraft, WorkoutStep};

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum WorkoutError {
  #[error("Validation failed: {0}")]
  Validation(String),

  #[error("Workout {0} not found")]
  NotFound(i64),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// ---------------------------------------------------------------------------
/// Row Mapping
/// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct WorkoutRow {
  id: i64,
  workout_name: String,
  notes: Option<String>,
  steps: Json<Vec<WorkoutStep>>,
  created_at: DateTime<Utc>,
}

impl From<WorkoutRow> for Workout {
  fn from(row: WorkoutRow) -> Self {
    Self {
      id: row.id,
      workout_name: row.workout_name,
      notes: row.notes,
      steps: row.steps.0,
      created_at: row.created_at,
    }
  }
}

/// Copy of `steps` with positions reassigned to 1..N in list order
pub fn reindex_steps(steps: &[WorkoutStep]) -> Vec<WorkoutStep> {
  steps
    .iter()
    .enumerate()
    .map(|(index, step)| WorkoutStep {
      order_index: index as i64 + 1,
      ..step.clone()
    })
    .collect()
}

fn validate_name(name: &str) -> Result<(), WorkoutError> {
  if name.trim().is_empty() {
    return Err(WorkoutError::Validation(
      "Please enter a workout title".to_string(),
    ));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Queries
/// ---------------------------------------------------------------------------

/// All workouts, newest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<Workout>, WorkoutError> {
  let rows = sqlx::query_as::<_, WorkoutRow>(
    r#"
    SELECT id, workout_name, notes, steps, created_at
    FROM workouts
    ORDER BY created_at DESC, id DESC
    "#,
  )
  .fetch_all(pool)
  .await?;

  Ok(rows.into_iter().map(Workout::from).collect())
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Workout, WorkoutError> {
  sqlx::query_as::<_, WorkoutRow>(
    "SELECT id, workout_name, notes, steps, created_at FROM workouts WHERE id = ?1",
  )
  .bind(id)
  .fetch_optional(pool)
  .await?
  .map(Workout::from)
  .ok_or(WorkoutError::NotFound(id))
}

/// Exercise choices, alphabetical
pub async fn list_exercises(pool: &SqlitePool) -> Result<Vec<Exercise>, WorkoutError> {
  Ok(
    sqlx::query_as::<_, Exercise>("SELECT id, name FROM exercises ORDER BY name ASC")
      .fetch_all(pool)
      .await?,
  )
}

/// ---------------------------------------------------------------------------
/// Writes
/// ---------------------------------------------------------------------------

/// Insert a new workout. A blank name is rejected before touching the store.
pub async fn create(pool: &SqlitePool, draft: &WorkoutDraft) -> Result<Workout, WorkoutError> {
  validate_name(&draft.workout_name)?;

  let steps = reindex_steps(&draft.steps);
  let created_at = Utc::now();

  let result = sqlx::query(
    r#"
    INSERT INTO workouts (workout_name, notes, steps, created_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(&draft.workout_name)
  .bind(&draft.notes)
  .bind(Json(&steps))
  .bind(created_at)
  .execute(pool)
  .await?;

  let id = result.last_insert_rowid();
  info!(workout_id = id, steps = steps.len(), "Workout created");

  Ok(Workout {
    id,
    workout_name: draft.workout_name.clone(),
    notes: draft.notes.clone(),
    steps,
    created_at,
  })
}

/// Overwrite name, notes and the whole step list of an existing workout
pub async fn update(
  pool: &SqlitePool,
  id: i64,
  draft: &WorkoutDraft,
) -> Result<Workout, WorkoutError> {
  validate_name(&draft.workout_name)?;

  let steps = reindex_steps(&draft.steps);

  let result = sqlx::query(
    r#"
    UPDATE workouts SET
      workout_name = ?1,
      notes = ?2,
      steps = ?3
    WHERE id = ?4
    "#,
  )
  .bind(&draft.workout_name)
  .bind(&draft.notes)
  .bind(Json(&steps))
  .bind(id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(WorkoutError::NotFound(id));
  }

  info!(workout_id = id, steps = steps.len(), "Workout updated");
  get(pool, id).await
}

/// What happened to the id counter after a delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum IdentityReset {
  NotRequested,
  Reset,
  Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
  pub id: i64,
  pub identity_reset: IdentityReset,
}

/// Remove a workout.
///
/// With `reset_identity` the id counter is compacted down to the highest
/// remaining id afterwards. That step is best effort: its failure is logged
/// and reported in the outcome, the delete itself still counts as done.
pub async fn delete(
  pool: &SqlitePool,
  id: i64,
  reset_identity: bool,
) -> Result<DeleteOutcome, WorkoutError> {
  let result = sqlx::query("DELETE FROM workouts WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(WorkoutError::NotFound(id));
  }

  info!(workout_id = id, "Workout deleted");

  let identity_reset = if reset_identity {
    match compact_identity(pool).await {
      Ok(()) => IdentityReset::Reset,
      Err(e) => {
        warn!(workout_id = id, error = %e, "Failed to reset workout id counter");
        IdentityReset::Failed(e.to_string())
      }
    }
  } else {
    IdentityReset::NotRequested
  };

  Ok(DeleteOutcome { id, identity_reset })
}

async fn compact_identity(pool: &SqlitePool) -> Result<(), sqlx::Error> {
  let result = sqlx::query(
    r#"
    UPDATE sqlite_sequence
    SET seq = (SELECT COALESCE(MAX(id), 0) FROM workouts)
    WHERE name = 'workouts'
    "#,
  )
  .execute(pool)
  .await?;

  debug!(rows = result.rows_affected(), "Workout id counter compacted");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
