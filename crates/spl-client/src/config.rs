//! Connection settings for the outbound services.

use std::time::Duration;

use serde::Deserialize;

/// Default timeout applied to every outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The recent-access feed.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
  pub base_url:   String,
  /// Sent as `X-Auth-Token`.
  pub auth_token: String,
}

/// The identity directory.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
  pub base_url:    String,
  /// Sent as `X-Auth-String`.
  pub auth_string: String,
}

/// The chat relay webhook (HTTP basic auth).
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}
