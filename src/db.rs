use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::llm::ClaudeClient;
use crate::sleep::SleepSource;

pub type DbPool = SqlitePool;

/// Application state shared by every request handler
pub struct AppState {
  pub db: DbPool,
  pub sleep: SleepSource,
  pub llm: ClaudeClient,
  pub chat_max_duration: Duration,
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, sqlx::Error> {
  info!("Initializing database at: {}", database_url);

  let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect_with(options)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_initialize_db_creates_file_and_schema() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("simplu.db").display());

    let pool = initialize_db(&url).await.expect("Should initialize");

    let exercises: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM exercises")
      .fetch_one(&pool)
      .await
      .expect("Should count exercises");
    assert!(exercises > 0, "exercise lookup is seeded");

    pool.close().await;
  }
}
