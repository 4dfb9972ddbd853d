//! Tracked identities: a chat's subscription to one external identity.
//!
//! The `last_*` timestamps record the most recent access already notified for
//! the subscription. Only the reconciliation engine moves them forward after
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest alias accepted from a subscriber.
pub const MAX_ALIAS_LEN: usize = 100;

// ─── TrackedIdentity ─────────────────────────────────────────────────────────

/// A persisted subscription. `(chat_id, natural_key)` is unique.
///
/// The JSON field names match the ones existing chat-bot consumers read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedIdentity {
  /// Store-assigned; never reused.
  pub id:            i64,
  pub chat_id:       String,
  pub external_id:   i32,
  #[serde(rename = "run")]
  pub natural_key:   String,
  #[serde(rename = "fullName")]
  pub display_name:  String,
  pub alias:         Option<String>,
  #[serde(rename = "lastEntry")]
  pub last_entry_at: Option<DateTime<Utc>>,
  #[serde(rename = "lastExit")]
  pub last_exit_at:  Option<DateTime<Utc>>,
}

impl TrackedIdentity {
  /// The name shown to the subscriber: the alias when one was given.
  pub fn label(&self) -> &str {
    self.alias.as_deref().unwrap_or(&self.display_name)
  }
}

/// Input to [`crate::store::TrackStore::create`]. The id is assigned by the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrackedIdentity {
  pub chat_id:       String,
  pub external_id:   i32,
  pub natural_key:   String,
  pub display_name:  String,
  pub alias:         Option<String>,
  pub last_entry_at: Option<DateTime<Utc>>,
  pub last_exit_at:  Option<DateTime<Utc>>,
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// A subscriber asking to follow an identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
  #[serde(default)]
  pub chat_id:     String,
  #[serde(rename = "run", default)]
  pub natural_key: String,
  pub alias:       Option<String>,
}

impl TrackRequest {
  pub fn validate(&self) -> Result<()> {
    require("chatId", &self.chat_id)?;
    require("run", &self.natural_key)?;
    if let Some(alias) = &self.alias {
      let len = alias.chars().count();
      if len == 0 || len > MAX_ALIAS_LEN {
        return Err(Error::AliasLength { len, max: MAX_ALIAS_LEN });
      }
    }
    Ok(())
  }
}

/// A subscriber asking to stop following an identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntrackRequest {
  #[serde(default)]
  pub chat_id:     String,
  #[serde(rename = "run", default)]
  pub natural_key: String,
}

impl UntrackRequest {
  pub fn validate(&self) -> Result<()> {
    require("chatId", &self.chat_id)?;
    require("run", &self.natural_key)
  }
}

fn require(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::MissingField(field));
  }
  Ok(())
}
