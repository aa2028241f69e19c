//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Sleep dataset fixtures
//! - Helper assertions

use crate::config::LlmConfig;
use crate::db::AppState;
use crate::llm::ClaudeClient;
use crate::models::{SleepDayEntry, SleepScores, WorkoutDraft, WorkoutStep};
use crate::sleep::SleepSource;
use chrono::{Duration, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Seed the database with test workouts, oldest first
/// Returns the IDs of created workouts in insertion order
pub async fn seed_test_workouts(pool: &SqlitePool, count: usize) -> Vec<i64> {
  let mut workout_ids = Vec::new();

  for i in 0..count {
    let created_at = Utc::now() - Duration::days((count - i) as i64);
    let steps = vec![
      WorkoutStep {
        order_index: 1,
        ..mock_step(3, "Squat")
      },
      WorkoutStep {
        order_index: 2,
        ..mock_step(2, "Deadlift")
      },
    ];

    let result = sqlx::query(
      r#"
      INSERT INTO workouts (workout_name, notes, steps, created_at)
      VALUES (?1, ?2, ?3, ?4)
      "#,
    )
    .bind(format!("Test workout {}", i))
    .bind(None::<String>)
    .bind(Json(&steps))
    .bind(created_at)
    .execute(pool)
    .await
    .expect("Failed to insert test workout");

    workout_ids.push(result.last_insert_rowid());
  }

  workout_ids
}

pub async fn count_workouts(pool: &SqlitePool) -> i64 {
  sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
    .fetch_one(pool)
    .await
    .expect("Failed to count workouts")
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_step(exercise_id: i64, exercise_name: &str) -> WorkoutStep {
  WorkoutStep {
    exercise_id,
    exercise_name: exercise_name.to_string(),
    reps: 10,
    weight_lbs: Some(135),
    order_index: 0,
  }
}

/// Draft with `steps` steps cycling through a few seeded exercises
pub fn mock_workout_draft(name: &str, steps: usize) -> WorkoutDraft {
  let exercises = [(3, "Squat"), (1, "Bench Press"), (2, "Deadlift"), (6, "Pull Up")];

  WorkoutDraft {
    workout_name: name.to_string(),
    notes: None,
    steps: (0..steps)
      .map(|i| {
        let (id, exercise) = exercises[i % exercises.len()];
        mock_step(id, exercise)
      })
      .collect(),
  }
}

pub fn mock_sleep_day(date: &str, overall: i64) -> SleepDayEntry {
  SleepDayEntry {
    calendar_date: Some(date.to_string()),
    sleep_scores: Some(SleepScores {
      overall_score: Some(overall),
      quality_score: Some(overall - 5),
      duration_score: Some(overall + 5),
      recovery_score: Some(overall),
      feedback: Some("POSITIVE_DEEP".to_string()),
      insight: Some("POSITIVE_RESTFUL_EVENING".to_string()),
    }),
  }
}

pub fn mock_sleep_day_without_scores(date: &str) -> SleepDayEntry {
  SleepDayEntry {
    calendar_date: Some(date.to_string()),
    sleep_scores: None,
  }
}

/// Write a sleep export to a temp file; keep the handle alive while in use
pub fn write_sleep_dataset(entries: &[SleepDayEntry]) -> NamedTempFile {
  let mut file = NamedTempFile::new().expect("Failed to create temp file");
  let json = serde_json::to_string(entries).expect("Failed to serialize dataset");
  file
    .write_all(json.as_bytes())
    .expect("Failed to write dataset");
  file
}

/// ---------------------------------------------------------------------------
/// Application State
/// ---------------------------------------------------------------------------

/// Shared state wired to a test pool, a sleep export path and a mock model server
pub fn test_state(
  pool: SqlitePool,
  sleep_path: impl Into<PathBuf>,
  llm_base_url: &str,
) -> Arc<AppState> {
  test_state_with_limit(pool, sleep_path, llm_base_url, std::time::Duration::from_secs(5))
}

pub fn test_state_with_limit(
  pool: SqlitePool,
  sleep_path: impl Into<PathBuf>,
  llm_base_url: &str,
  chat_max_duration: std::time::Duration,
) -> Arc<AppState> {
  let llm = ClaudeClient::from_config(&LlmConfig {
    api_key: "test-key".to_string(),
    base_url: llm_base_url.to_string(),
    model: "claude-test".to_string(),
    max_tokens: 256,
  })
  .expect("Failed to build test client");

  Arc::new(AppState {
    db: pool,
    sleep: SleepSource::new(sleep_path),
    llm,
    chat_max_duration,
  })
}

/// Streaming response body emitting one text delta per chunk
pub fn mock_sse_body(chunks: &[&str]) -> String {
  let mut body = String::from(
    "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_test\"}}\n\n",
  );
  for chunk in chunks {
    let event = serde_json::json!({
      "type": "content_block_delta",
      "index": 0,
      "delta": {"type": "text_delta", "text": chunk},
    });
    body.push_str(&format!("event: content_block_delta\ndata: {}\n\n", event));
  }
  body.push_str("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
  body
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workouts', 'exercises')",
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 2, "Expected 2 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_workouts_returns_correct_count() {
    let pool = setup_test_db().await;

    let ids = seed_test_workouts(&pool, 5).await;
    assert_eq!(ids.len(), 5);
    assert_eq!(count_workouts(&pool).await, 5);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let draft = mock_workout_draft("Push", 5);
    assert_eq!(draft.steps.len(), 5);
    assert!(draft.is_complete());

    let day = mock_sleep_day("2025-04-13", 70);
    assert_eq!(day.sleep_scores.unwrap().overall_score, Some(70));
  }

  #[test]
  fn test_write_sleep_dataset_round_trips() {
    let file = write_sleep_dataset(&[mock_sleep_day("2025-04-13", 70)]);
    let raw = std::fs::read_to_string(file.path()).unwrap();
    assert!(raw.contains("\"calendarDate\":\"2025-04-13\""));
  }
}
