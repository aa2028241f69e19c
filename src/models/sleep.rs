use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day from the wearable sleep export.
///
/// Only the fields the score view needs are modelled; everything else in the
/// export is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepDayEntry {
  #[serde(default)]
  pub calendar_date: Option<String>,
  #[serde(default)]
  pub sleep_scores: Option<SleepScores>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepScores {
  #[serde(default)]
  pub overall_score: Option<i64>,
  #[serde(default)]
  pub quality_score: Option<i64>,
  #[serde(default)]
  pub duration_score: Option<i64>,
  #[serde(default)]
  pub recovery_score: Option<i64>,
  #[serde(default)]
  pub feedback: Option<String>,
  #[serde(default)]
  pub insight: Option<String>,
}

/// Flat score record derived from a [`SleepDayEntry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedSleepEntry {
  pub date: String,
  pub overall_score: Option<i64>,
  pub quality_score: Option<i64>,
  pub duration_score: Option<i64>,
  pub recovery_score: Option<i64>,
  pub feedback: Option<String>,
  pub insight: Option<String>,
}

impl ProcessedSleepEntry {
  pub fn parsed_date(&self) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
  }
}

/// Nest a processed entry back into the export shape
impl From<&ProcessedSleepEntry> for SleepDayEntry {
  fn from(entry: &ProcessedSleepEntry) -> Self {
    Self {
      calendar_date: Some(entry.date.clone()),
      sleep_scores: Some(SleepScores {
        overall_score: entry.overall_score,
        quality_score: entry.quality_score,
        duration_score: entry.duration_score,
        recovery_score: entry.recovery_score,
        feedback: entry.feedback.clone(),
        insight: entry.insight.clone(),
      }),
    }
  }
}

/// Colour band used when showing an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
  Excellent,
  Good,
  Fair,
  Poor,
}

impl ScoreBand {
  pub fn from_score(score: i64) -> Self {
    match score {
      s if s >= 80 => Self::Excellent,
      s if s >= 60 => Self::Good,
      s if s >= 40 => Self::Fair,
      _ => Self::Poor,
    }
  }
}

/// Aggregate figures shown above the sleep table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
  pub entries: usize,
  pub average_overall: Option<f64>,
  pub max_overall: Option<i64>,
  pub min_overall: Option<i64>,
}
