//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings in UTC. Sub-second precision is
//! kept: the engine compares timestamps for exact equality, so truncating
//! here would make every cycle look like a change.

use chrono::{DateTime, SecondsFormat, Utc};
use spl_core::tracked::TrackedIdentity;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn decode_dt(column: &'static str, s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse { column, reason: e.to_string() })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawTrackedIdentity::from_row`].
pub const TRACKED_COLUMNS: &str = "id, chat_id, external_id, natural_key, \
                                   display_name, alias, last_entry_at, \
                                   last_exit_at";

/// Raw values read directly from a `tracked_identities` row.
pub struct RawTrackedIdentity {
  pub id:            i64,
  pub chat_id:       String,
  pub external_id:   i32,
  pub natural_key:   String,
  pub display_name:  String,
  pub alias:         Option<String>,
  pub last_entry_at: Option<String>,
  pub last_exit_at:  Option<String>,
}

impl RawTrackedIdentity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      chat_id:       row.get(1)?,
      external_id:   row.get(2)?,
      natural_key:   row.get(3)?,
      display_name:  row.get(4)?,
      alias:         row.get(5)?,
      last_entry_at: row.get(6)?,
      last_exit_at:  row.get(7)?,
    })
  }

  pub fn into_tracked(self) -> Result<TrackedIdentity> {
    let last_entry_at = self
      .last_entry_at
      .as_deref()
      .map(|s| decode_dt("last_entry_at", s))
      .transpose()?;
    let last_exit_at = self
      .last_exit_at
      .as_deref()
      .map(|s| decode_dt("last_exit_at", s))
      .transpose()?;

    Ok(TrackedIdentity {
      id: self.id,
      chat_id: self.chat_id,
      external_id: self.external_id,
      natural_key: self.natural_key,
      display_name: self.display_name,
      alias: self.alias,
      last_entry_at,
      last_exit_at,
    })
  }
}
