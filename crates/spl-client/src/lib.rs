//! HTTP adapters for the service's outbound collaborators.
//!
//! - [`UpstreamClient`] reads the recent-access feed and resolves natural keys
//!   through the identity directory.
//! - [`WebhookDispatcher`] delivers notifications and free-text messages to
//!   the chat relay.
//!
//! Every client carries an explicit request timeout.

pub mod config;
pub mod dto;
pub mod error;
pub mod upstream;
pub mod webhook;

pub use config::{AccessConfig, IdentityConfig, NotificationConfig};
pub use error::{Error, Result};
pub use upstream::UpstreamClient;
pub use webhook::WebhookDispatcher;

/// Join a configured base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
  format!(
    "{}/{}",
    base.trim_end_matches('/'),
    path.trim_start_matches('/')
  )
}
