pub mod assistant;
pub mod commands;
pub mod config;
pub mod db;
pub mod llm;
pub mod models;
pub mod sleep;
pub mod workouts;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

use config::{AppConfig, ConfigError};
use db::AppState;
use llm::{ClaudeClient, LlmError};
use sleep::{SleepError, SleepSource};

#[derive(Error, Debug)]
pub enum StartupError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Sleep dataset unusable: {0}")]
  SleepData(#[from] SleepError),

  #[error("Model client error: {0}")]
  Llm(#[from] LlmError),

  #[error("Server error: {0}")]
  Server(#[from] std::io::Error),
}

/// Load configuration, prepare shared state and serve until shutdown
pub async fn run() -> Result<(), StartupError> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let config = AppConfig::from_env()?;
  let db = db::initialize_db(&config.database_url).await?;

  // A broken export should stop startup rather than fail every request
  let sleep = SleepSource::new(config.sleep_data_path.clone());
  let entries = sleep.scores().await?;
  info!(
    path = %sleep.path().display(),
    entries = entries.len(),
    "Sleep dataset ready"
  );

  let llm = ClaudeClient::from_config(&config.llm)?;
  info!(model = llm.model(), "Model client ready");

  let state = Arc::new(AppState {
    db,
    sleep,
    llm,
    chat_max_duration: config.chat_max_duration,
  });

  let listener = TcpListener::bind(config.bind_addr).await?;
  info!("Listening on {}", config.bind_addr);
  axum::serve(listener, commands::router(state)).await?;

  Ok(())
}
