//! Access records: the facts reported by the upstream access source.
//!
//! An access record says that an identity entered a location at some instant
//! and, possibly, left it again. Records are never persisted here; each poll
//! cycle consumes a fresh batch.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Location ────────────────────────────────────────────────────────────────

/// Numeric code of a physical location, as reported upstream.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct LocationCode(pub i16);

impl LocationCode {
  /// Human-readable location name; unknown codes map to a fixed fallback.
  pub fn name(self) -> &'static str {
    match self.0 {
      102 => "Espacio Urbano",
      104 => "Calama",
      105 => "Pacífico",
      106 => "Arauco",
      107 => "Iquique",
      108 => "Angamos",
      _ => "Unknown Location",
    }
  }
}

impl fmt::Display for LocationCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── AccessRecord ────────────────────────────────────────────────────────────

/// One entry (and optional exit) of an identity at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
  pub external_id:  i32,
  pub natural_key:  String,
  pub display_name: String,
  pub location:     LocationCode,
  pub entry_at:     DateTime<Utc>,
  /// `None` while the identity is still inside.
  pub exit_at:      Option<DateTime<Utc>>,
}
