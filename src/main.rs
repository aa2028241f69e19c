use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("simplu=info,tower_http=info")),
    )
    .init();

  match simplu::run().await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("Failed to start: {}", e);
      ExitCode::FAILURE
    }
  }
}
