//! Context routing for the fitness chat assistant
//!
//! The latest message is matched against a short, ordered list of keyword
//! groups. The first group that matches decides which data is fetched and
//! injected as a system message ahead of the conversation. When nothing
//! matches, or the fetch fails, the conversation is forwarded untouched.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::AppState;
use crate::llm::{LlmError, TextStream};
use crate::models::{ChatMessage, ProcessedSleepEntry, Role, Workout};
use crate::sleep::{SleepError, SleepSource};
use crate::workouts::{self, WorkoutError};

/// ---------------------------------------------------------------------------
/// Routing Table
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
  Workouts,
  Sleep,
}

impl ContextSource {
  fn label(self) -> &'static str {
    match self {
      Self::Workouts => "workout",
      Self::Sleep => "sleep",
    }
  }
}

/// Checked top to bottom; workouts win when a message mentions both.
pub const ROUTES: &[(ContextSource, &[&str])] = &[
  (ContextSource::Workouts, &["workout", "exercise", "training"]),
  (ContextSource::Sleep, &["sleep"]),
];

/// Pick the context source for the most recent message, if any
pub fn select_source(conversation: &[ChatMessage]) -> Option<ContextSource> {
  let text = conversation.last()?.text_content().to_lowercase();

  ROUTES
    .iter()
    .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
    .map(|(source, _)| *source)
}

/// ---------------------------------------------------------------------------
/// Context Builders
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ContextError {
  #[error("Failed to load workouts: {0}")]
  Workouts(#[from] WorkoutError),

  #[error("Failed to load sleep data: {0}")]
  Sleep(#[from] SleepError),

  #[error("Failed to serialize context: {0}")]
  Serialize(#[from] serde_json::Error),
}

pub fn workout_context(workouts: &[Workout]) -> Result<String, serde_json::Error> {
  Ok(format!(
    "Here's your workout information:\n{}",
    serde_json::to_string_pretty(workouts)?
  ))
}

pub fn sleep_context(entries: &[ProcessedSleepEntry]) -> String {
  let lines = entries
    .iter()
    .map(|entry| {
      let score = entry
        .overall_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "n/a".to_string());
      format!("Date: {} | Overall Score: {}/100", entry.date, score)
    })
    .collect::<Vec<_>>()
    .join("\n");

  format!(
    "Here's your sleep data:\n\n{}\n\nTotal entries: {}",
    lines,
    entries.len()
  )
}

async fn build_context(
  source: ContextSource,
  db: &SqlitePool,
  sleep: &SleepSource,
) -> Result<String, ContextError> {
  match source {
    ContextSource::Workouts => Ok(workout_context(&workouts::list(db).await?)?),
    ContextSource::Sleep => Ok(sleep_context(&sleep.scores().await?)),
  }
}

/// Synthetic, never-persisted system message carrying the context
pub fn system_message(source: ContextSource, context: &str) -> ChatMessage {
  ChatMessage {
    id: Some("context".to_string()),
    ..ChatMessage::text(
      Role::System,
      format!(
        "You are a helpful fitness assistant. Use this {} data to answer questions: {}",
        source.label(),
        context
      ),
    )
  }
}

/// ---------------------------------------------------------------------------
/// Routing
/// ---------------------------------------------------------------------------

/// Conversation to forward: context message + originals, or the originals
/// unchanged when no source applies or its data cannot be loaded.
pub async fn prepare_conversation(
  conversation: Vec<ChatMessage>,
  db: &SqlitePool,
  sleep: &SleepSource,
) -> Vec<ChatMessage> {
  let Some(source) = select_source(&conversation) else {
    debug!("No context keywords matched");
    return conversation;
  };

  match build_context(source, db, sleep).await {
    Ok(context) => {
      debug!(source = source.label(), bytes = context.len(), "Injecting chat context");
      let mut forwarded = Vec::with_capacity(conversation.len() + 1);
      forwarded.push(system_message(source, &context));
      forwarded.extend(conversation);
      forwarded
    }
    Err(e) => {
      warn!(source = source.label(), error = %e, "Context fetch failed, continuing without it");
      conversation
    }
  }
}

/// Inject context and stream the model's reply
pub async fn route(
  state: &AppState,
  conversation: Vec<ChatMessage>,
) -> Result<TextStream, LlmError> {
  let forwarded = prepare_conversation(conversation, &state.db, &state.sleep).await;
  state.llm.stream(&forwarded).await
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
