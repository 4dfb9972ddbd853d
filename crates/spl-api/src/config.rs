//! Runtime configuration.
//!
//! Read once at startup from an optional TOML file, overlaid by `SPL_*`
//! environment variables (`__` separates nested keys, e.g.
//! `SPL_SERVER__AUTH_TOKEN`), and shared immutably afterwards.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use spl_client::{AccessConfig, IdentityConfig, NotificationConfig};
use thiserror::Error;

/// Why the configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error(transparent)]
  Load(#[from] config::ConfigError),

  #[error("{0} must be greater than zero")]
  Zero(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub server:       ListenConfig,
  #[serde(default)]
  pub store:        StoreConfig,
  #[serde(default)]
  pub schedule:     ScheduleConfig,
  pub access:       AccessConfig,
  pub identity:     IdentityConfig,
  pub notification: NotificationConfig,
}

impl ServerConfig {
  /// Load from `path` (skipped when absent) and the environment, then
  /// [`validate`](Self::validate).
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let cfg: Self = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SPL")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Reject values the runtime cannot operate with. A zero poll interval
  /// panics `tokio::time::interval`, a zero capacity panics `mpsc::channel`,
  /// and a zero timeout fails every request.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let s = &self.schedule;
    if s.poll_interval_ms == 0 {
      return Err(ConfigError::Zero("schedule.poll_interval_ms"));
    }
    if s.request_timeout_secs == 0 {
      return Err(ConfigError::Zero("schedule.request_timeout_secs"));
    }
    if s.queue_capacity == 0 {
      return Err(ConfigError::Zero("schedule.queue_capacity"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  /// Expected in the `X-Auth-Token` header of every `/track` request.
  pub auth_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  pub path: PathBuf,
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self { path: PathBuf::from("spl.db") }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
  pub poll_interval_ms:     u64,
  pub request_timeout_secs: u64,
  /// Notifications buffered ahead of the delivery worker.
  pub queue_capacity:       usize,
}

impl Default for ScheduleConfig {
  fn default() -> Self {
    Self {
      poll_interval_ms:     5_000,
      request_timeout_secs: spl_client::config::DEFAULT_TIMEOUT.as_secs(),
      queue_capacity:       256,
    }
  }
}

impl ScheduleConfig {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.request_timeout_secs)
  }
}

fn default_host() -> String {
  "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
  3000
}
