//! Sleep score view over the wearable export
//!
//! The export is a static JSON array with one record per calendar day. It is
//! re-read on every request and reduced to flat, date-ordered score records.
//! Days without a date or without a score block are dropped silently.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::models::{ProcessedSleepEntry, ScoreBand, SleepDayEntry, SleepSummary};

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SleepError {
  #[error("Failed to read sleep dataset {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Malformed sleep dataset: {0}")]
  Format(#[from] serde_json::Error),
}

/// ---------------------------------------------------------------------------
/// Normalizer
/// ---------------------------------------------------------------------------

/// Filter, flatten and order the raw export.
///
/// An entry is kept only when both its calendar date and its score block are
/// present. Output is sorted ascending by date; equal dates keep their input
/// order. Dates that do not parse as `YYYY-MM-DD` sort first.
pub fn normalize(entries: &[SleepDayEntry]) -> Vec<ProcessedSleepEntry> {
  let mut processed: Vec<ProcessedSleepEntry> = entries
    .iter()
    .filter_map(|entry| {
      let date = entry.calendar_date.as_ref()?;
      let scores = entry.sleep_scores.as_ref()?;
      Some(ProcessedSleepEntry {
        date: date.clone(),
        overall_score: scores.overall_score,
        quality_score: scores.quality_score,
        duration_score: scores.duration_score,
        recovery_score: scores.recovery_score,
        feedback: scores.feedback.clone(),
        insight: scores.insight.clone(),
      })
    })
    .collect();

  // sort_by_key is stable
  processed.sort_by_key(|entry| entry.parsed_date());
  processed
}

/// Parse the export. Anything that is not an array of day objects is a
/// format error; nothing is fabricated for entries that fail to parse.
pub fn parse_dataset(json: &str) -> Result<Vec<SleepDayEntry>, SleepError> {
  Ok(serde_json::from_str(json)?)
}

/// Overall-score aggregates for the sleep tab
pub fn summarize(entries: &[ProcessedSleepEntry]) -> SleepSummary {
  let scores: Vec<i64> = entries.iter().filter_map(|e| e.overall_score).collect();

  let average_overall = if scores.is_empty() {
    None
  } else {
    Some(scores.iter().sum::<i64>() as f64 / scores.len() as f64)
  };

  SleepSummary {
    entries: entries.len(),
    average_overall,
    max_overall: scores.iter().copied().max(),
    min_overall: scores.iter().copied().min(),
  }
}

/// Processed entry with its display band
#[derive(Debug, Clone, Serialize)]
pub struct BandedSleepEntry {
  #[serde(flatten)]
  pub entry: ProcessedSleepEntry,
  pub band: Option<ScoreBand>,
}

pub fn with_bands(entries: Vec<ProcessedSleepEntry>) -> Vec<BandedSleepEntry> {
  entries
    .into_iter()
    .map(|entry| BandedSleepEntry {
      band: entry.overall_score.map(ScoreBand::from_score),
      entry,
    })
    .collect()
}

/// ---------------------------------------------------------------------------
/// Dataset Source
/// ---------------------------------------------------------------------------

/// Location of the static export on disk
#[derive(Debug, Clone)]
pub struct SleepSource {
  path: PathBuf,
}

impl SleepSource {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read and parse the raw export
  pub async fn load(&self) -> Result<Vec<SleepDayEntry>, SleepError> {
    let raw = tokio::fs::read_to_string(&self.path)
      .await
      .map_err(|source| SleepError::Io {
        path: self.path.display().to_string(),
        source,
      })?;
    parse_dataset(&raw)
  }

  /// Read, parse and normalize in one go
  pub async fn scores(&self) -> Result<Vec<ProcessedSleepEntry>, SleepError> {
    Ok(normalize(&self.load().await?))
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
