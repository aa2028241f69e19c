use std::future;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use super::ApiError;
use crate::assistant;
use crate::db::AppState;
use crate::models::ChatRequest;

/// Stream the assistant's reply as plain text.
///
/// One deadline covers the whole exchange: context lookup, the upstream
/// request and the streamed body. Whatever has arrived when it passes is all
/// the client gets.
pub async fn chat(
  State(state): State<Arc<AppState>>,
  Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
  if request.messages.is_empty() {
    return Err(ApiError::Validation(
      "A chat request needs at least one message".to_string(),
    ));
  }

  let deadline = Instant::now() + state.chat_max_duration;
  debug!(messages = request.messages.len(), "Chat request received");

  let reply = time::timeout_at(deadline, assistant::route(&state, request.messages))
    .await
    .map_err(|_| ApiError::Timeout)??;

  let body = reply
    .take_until(time::sleep_until(deadline))
    .take_while(|chunk| {
      if let Err(e) = chunk {
        warn!(error = %e, "Model stream failed, ending reply early");
      }
      future::ready(chunk.is_ok())
    })
    .map(|chunk| chunk.map(Bytes::from));

  Ok(
    (
      [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
      Body::from_stream(body),
    )
      .into_response(),
  )
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
