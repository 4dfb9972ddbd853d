//! Notification events and subscriber-facing message text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{access::LocationCode, tracked::TrackedIdentity};

/// Sent when a subscriber asks to follow an identity the upstream lookup
/// does not know.
pub const MSG_UNKNOWN_IDENTITY: &str = "Usuario no existente";
pub const MSG_TRACK_ADDED: &str = "✅ Agregado";
pub const MSG_TRACK_REMOVED: &str = "✅ Eliminado";
pub const MSG_EMPTY_LIST: &str = "No tienes seguimientos.";

/// Which side of an access changed.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
  Entry,
  Exit,
}

/// One change to deliver to one subscriber. Produced by the engine and
/// consumed once by a dispatcher; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
  pub kind:         NotificationKind,
  pub occurred_at:  DateTime<Utc>,
  pub chat_id:      String,
  #[serde(rename = "run")]
  pub natural_key:  String,
  #[serde(rename = "fullName")]
  pub display_name: String,
  pub alias:        Option<String>,
  pub location:     LocationCode,
}

/// Render a chat's subscriptions as a chat message.
pub fn format_track_list(tracks: &[TrackedIdentity]) -> String {
  if tracks.is_empty() {
    return MSG_EMPTY_LIST.to_owned();
  }

  let lines: Vec<String> = tracks
    .iter()
    .map(|t| format!("- {} {}", t.natural_key, t.label()))
    .collect();
  format!("📋 Listado:\n{}", lines.join("\n"))
}
