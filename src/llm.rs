//! LLM integration for the fitness assistant
//!
//! This module handles communication with the Claude Messages API. Replies are
//! requested in streaming mode and relayed as plain text chunks.

use std::collections::VecDeque;
use std::mem;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::LlmConfig;
use crate::models::{ChatMessage, Role};

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const MESSAGES_PATH: &str = "v1/messages";
const API_VERSION: &str = "2023-06-01";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum LlmError {
  #[error("Invalid API base URL: {0}")]
  BaseUrl(#[from] url::ParseError),

  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("API error: {0}")]
  Api(String),
}

/// Text chunks as they arrive from the model
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// ---------------------------------------------------------------------------
/// Claude API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ClaudeRequest {
  model: String,
  max_tokens: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  system: Option<String>,
  messages: Vec<ClaudeMessage>,
  stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ClaudeMessage {
  role: &'static str,
  content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorResponse {
  error: ClaudeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
  message: String,
}

/// Streaming events; only text deltas and errors matter to us
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
  ContentBlockDelta { delta: Delta },
  Error { error: ClaudeErrorDetail },
  #[serde(other)]
  Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
  TextDelta { text: String },
  #[serde(other)]
  Other,
}

/// Split a conversation into Claude's top-level system prompt and the
/// user/assistant turns. Consecutive turns of the same role are merged since
/// the API expects them to alternate; turns without text are skipped.
fn to_claude_messages(conversation: &[ChatMessage]) -> (Option<String>, Vec<ClaudeMessage>) {
  let mut system_parts = Vec::new();
  let mut messages: Vec<ClaudeMessage> = Vec::new();

  for message in conversation {
    let text = message.text_content();
    if text.trim().is_empty() {
      continue;
    }

    let role = match message.role {
      Role::System => {
        system_parts.push(text);
        continue;
      }
      Role::User => "user",
      Role::Assistant => "assistant",
    };

    match messages.last_mut() {
      Some(last) if last.role == role => {
        last.content.push_str("\n\n");
        last.content.push_str(&text);
      }
      _ => messages.push(ClaudeMessage { role, content: text }),
    }
  }

  let system = if system_parts.is_empty() {
    None
  } else {
    Some(system_parts.join("\n\n"))
  };

  (system, messages)
}

/// ---------------------------------------------------------------------------
/// SSE Parsing
/// ---------------------------------------------------------------------------

/// Line buffer for server-sent events.
///
/// Network chunks do not line up with event boundaries: one chunk may carry
/// several events and a `data:` line may be split across two chunks.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
  buffer: Vec<u8>,
}

impl SseLineBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append bytes and return the payloads of all complete `data:` lines.
  ///
  /// Bytes are only decoded once a whole line is buffered, so a multi-byte
  /// character split across chunks comes out intact.
  pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
    self.buffer.extend_from_slice(bytes);

    let mut payloads = Vec::new();
    while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
      let line: Vec<u8> = self.buffer.drain(..=newline).collect();
      if let Some(data) = data_payload(&String::from_utf8_lossy(&line)) {
        payloads.push(data);
      }
    }
    payloads
  }

  /// Whatever is left once the body ends without a trailing newline
  pub fn flush(&mut self) -> Vec<String> {
    let rest = mem::take(&mut self.buffer);
    data_payload(&String::from_utf8_lossy(&rest)).into_iter().collect()
  }
}

fn data_payload(line: &str) -> Option<String> {
  let data = line.trim().strip_prefix("data:")?.trim();
  if data.is_empty() {
    None
  } else {
    Some(data.to_string())
  }
}

/// Turn one `data:` payload into a text chunk, an error, or nothing
fn parse_event(data: &str) -> Option<Result<String, LlmError>> {
  match serde_json::from_str::<StreamEvent>(data) {
    Ok(StreamEvent::ContentBlockDelta {
      delta: Delta::TextDelta { text },
    }) if !text.is_empty() => Some(Ok(text)),
    Ok(StreamEvent::Error { error }) => Some(Err(LlmError::Api(error.message))),
    Ok(_) => None,
    Err(e) => {
      warn!(error = %e, "Failed to parse streaming event");
      None
    }
  }
}

struct SseState<S> {
  body: Pin<Box<S>>,
  parser: SseLineBuffer,
  pending: VecDeque<Result<String, LlmError>>,
  ended: bool,
}

/// Wrap a response body in SSE framing and yield text deltas
fn text_stream<S>(body: S) -> TextStream
where
  S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
  let state = SseState {
    body: Box::pin(body),
    parser: SseLineBuffer::new(),
    pending: VecDeque::new(),
    ended: false,
  };

  let stream = stream::unfold(state, |mut state| async move {
    loop {
      if let Some(item) = state.pending.pop_front() {
        return Some((item, state));
      }
      if state.ended {
        return None;
      }

      let payloads = match state.body.next().await {
        Some(Ok(bytes)) => state.parser.feed(&bytes),
        Some(Err(e)) => {
          state.ended = true;
          return Some((Err(LlmError::Request(e)), state));
        }
        None => {
          state.ended = true;
          state.parser.flush()
        }
      };

      state
        .pending
        .extend(payloads.iter().filter_map(|data| parse_event(data)));
    }
  });

  Box::pin(stream)
}

/// ---------------------------------------------------------------------------
/// Claude Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClaudeClient {
  client: Client,
  api_key: String,
  endpoint: Url,
  model: String,
  max_tokens: u32,
}

impl ClaudeClient {
  pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
    let endpoint = Url::parse(&config.base_url)?.join(MESSAGES_PATH)?;

    Ok(Self {
      client: Client::new(),
      api_key: config.api_key.clone(),
      endpoint,
      model: config.model.clone(),
      max_tokens: config.max_tokens,
    })
  }

  pub fn model(&self) -> &str {
    &self.model
  }

  /// Send the conversation and stream the reply.
  ///
  /// System-role messages become the request's system prompt. Dropping the
  /// returned stream drops the underlying HTTP response, which cancels the
  /// upstream generation.
  pub async fn stream(&self, conversation: &[ChatMessage]) -> Result<TextStream, LlmError> {
    let (system, messages) = to_claude_messages(conversation);

    let request = ClaudeRequest {
      model: self.model.clone(),
      max_tokens: self.max_tokens,
      system,
      messages,
      stream: true,
    };

    debug!(
      model = %self.model,
      messages = request.messages.len(),
      has_system = request.system.is_some(),
      "Starting streaming completion"
    );

    let response = self
      .client
      .post(self.endpoint.clone())
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", API_VERSION)
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      if let Ok(error_resp) = serde_json::from_str::<ClaudeErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
    }

    Ok(text_stream(response.bytes_stream()))
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
