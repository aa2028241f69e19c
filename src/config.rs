//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file by `dotenvy` before [`AppConfig::from_env`] runs.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

const DEFAULT_DATABASE_URL: &str = "sqlite://simplu.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_LLM_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_LLM_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_LLM_MAX_TOKENS: u32 = 1024;
const DEFAULT_CHAT_MAX_DURATION_SECS: u64 = 30;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid value for {key}: {value}")]
  Invalid { key: String, value: String },
}

/// ---------------------------------------------------------------------------
/// Configuration Structures
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LlmConfig {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub sleep_data_path: PathBuf,
  pub bind_addr: SocketAddr,
  /// Hard cap on how long one chat response may stream
  pub chat_max_duration: Duration,
  pub llm: LlmConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Ok(Self {
      database_url: optional("DATABASE_URL", DEFAULT_DATABASE_URL),
      sleep_data_path: PathBuf::from(required("SLEEP_DATA_PATH")?),
      bind_addr: parsed("BIND_ADDR", DEFAULT_BIND_ADDR)?,
      chat_max_duration: Duration::from_secs(parsed(
        "CHAT_MAX_DURATION_SECS",
        &DEFAULT_CHAT_MAX_DURATION_SECS.to_string(),
      )?),
      llm: LlmConfig {
        api_key: required("ANTHROPIC_API_KEY")?,
        base_url: optional("LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
        model: optional("LLM_MODEL", DEFAULT_LLM_MODEL),
        max_tokens: parsed("LLM_MAX_TOKENS", &DEFAULT_LLM_MAX_TOKENS.to_string())?,
      },
    })
  }
}

fn required(key: &str) -> Result<String, ConfigError> {
  env::var(key)
    .ok()
    .filter(|v| !v.trim().is_empty())
    .ok_or_else(|| ConfigError::Missing(key.into()))
}

fn optional(key: &str, default: &str) -> String {
  env::var(key)
    .ok()
    .filter(|v| !v.trim().is_empty())
    .unwrap_or_else(|| default.to_string())
}

fn parsed<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
  let value = optional(key, default);
  value.trim().parse().map_err(|_| ConfigError::Invalid {
    key: key.into(),
    value,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const ALL_KEYS: [&str; 8] = [
    "DATABASE_URL",
    "SLEEP_DATA_PATH",
    "BIND_ADDR",
    "CHAT_MAX_DURATION_SECS",
    "ANTHROPIC_API_KEY",
    "LLM_BASE_URL",
    "LLM_MODEL",
    "LLM_MAX_TOKENS",
  ];

  fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
    let all: Vec<(&str, Option<&str>)> = ALL_KEYS
      .iter()
      .map(|key| {
        let value = vars.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
        (*key, value)
      })
      .collect();
    temp_env::with_vars(all, f);
  }

  #[test]
  #[serial]
  fn test_defaults_applied() {
    with_env(
      &[("SLEEP_DATA_PATH", "/data/sleep.json"), ("ANTHROPIC_API_KEY", "sk-test")],
      || {
        let config = AppConfig::from_env().expect("Should load");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.sleep_data_path, PathBuf::from("/data/sleep.json"));
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.chat_max_duration, Duration::from_secs(30));
        assert_eq!(config.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.llm.max_tokens, 1024);
      },
    );
  }

  #[test]
  #[serial]
  fn test_overrides_read() {
    with_env(
      &[
        ("SLEEP_DATA_PATH", "sleep.json"),
        ("ANTHROPIC_API_KEY", "sk-test"),
        ("DATABASE_URL", "sqlite::memory:"),
        ("BIND_ADDR", "0.0.0.0:8080"),
        ("CHAT_MAX_DURATION_SECS", "5"),
        ("LLM_MODEL", "claude-haiku"),
        ("LLM_MAX_TOKENS", "2048"),
      ],
      || {
        let config = AppConfig::from_env().expect("Should load");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.chat_max_duration, Duration::from_secs(5));
        assert_eq!(config.llm.model, "claude-haiku");
        assert_eq!(config.llm.max_tokens, 2048);
      },
    );
  }

  #[test]
  #[serial]
  fn test_missing_api_key() {
    with_env(&[("SLEEP_DATA_PATH", "sleep.json")], || {
      let err = AppConfig::from_env().unwrap_err();
      assert_eq!(err, ConfigError::Missing("ANTHROPIC_API_KEY".into()));
    });
  }

  #[test]
  #[serial]
  fn test_blank_sleep_path_counts_as_missing() {
    with_env(
      &[("SLEEP_DATA_PATH", "  "), ("ANTHROPIC_API_KEY", "sk-test")],
      || {
        let err = AppConfig::from_env().unwrap_err();
        assert_eq!(err, ConfigError::Missing("SLEEP_DATA_PATH".into()));
      },
    );
  }

  #[test]
  #[serial]
  fn test_invalid_number_rejected() {
    with_env(
      &[
        ("SLEEP_DATA_PATH", "sleep.json"),
        ("ANTHROPIC_API_KEY", "sk-test"),
        ("CHAT_MAX_DURATION_SECS", "thirty"),
      ],
      || {
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == "CHAT_MAX_DURATION_SECS"));
      },
    );
  }
}
