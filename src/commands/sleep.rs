use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::ApiError;
use crate::db::AppState;
use crate::models::SleepSummary;
use crate::sleep::{self, BandedSleepEntry};

/// Processed sleep scores, oldest first, each tagged with its score band
pub async fn get_sleep_scores(
  State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BandedSleepEntry>>, ApiError> {
  let entries = state.sleep.scores().await?;
  Ok(Json(sleep::with_bands(entries)))
}

pub async fn get_sleep_summary(
  State(state): State<Arc<AppState>>,
) -> Result<Json<SleepSummary>, ApiError> {
  let entries = state.sleep.scores().await?;
  Ok(Json(sleep::summarize(&entries)))
}
