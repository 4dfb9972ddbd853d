//! Wire shapes of the upstream services and their conversion into domain
//! types.
//!
//! The access feed sends every field as a string. Conversion is strict: one
//! bad field in one record fails the whole batch rather than silently
//! dropping the record.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use spl_core::{
  access::{AccessRecord, LocationCode},
  upstream::UpstreamIdentity,
};

use crate::{Error, Result};

// ─── Access feed ─────────────────────────────────────────────────────────────

/// Envelope of `GET /api/access/recently`.
#[derive(Debug, Deserialize)]
pub struct RecentAccessResponse {
  #[serde(default)]
  pub data: Vec<AccessDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDto {
  pub external_id: String,
  pub run:         String,
  pub full_name:   String,
  pub location:    String,
  pub entry_at:    String,
  pub exit_at:     Option<String>,
}

impl AccessDto {
  /// Convert one record; `index` locates it in the batch for error reports.
  pub fn into_record(self, index: usize) -> Result<AccessRecord> {
    let parse_err = |field: &'static str, reason: String| Error::Parse {
      index,
      field,
      reason,
    };

    let external_id = self
      .external_id
      .trim()
      .parse::<i32>()
      .map_err(|e| parse_err("externalId", e.to_string()))?;
    let location = self
      .location
      .trim()
      .parse::<i16>()
      .map_err(|e| parse_err("location", e.to_string()))?;
    let entry_at = parse_timestamp(&self.entry_at)
      .map_err(|e| parse_err("entryAt", e.to_string()))?;
    let exit_at = self
      .exit_at
      .as_deref()
      .map(parse_timestamp)
      .transpose()
      .map_err(|e| parse_err("exitAt", e.to_string()))?;

    Ok(AccessRecord {
      external_id,
      natural_key: self.run,
      display_name: self.full_name,
      location: LocationCode(location),
      entry_at,
      exit_at,
    })
  }
}

impl RecentAccessResponse {
  pub fn into_records(self) -> Result<Vec<AccessRecord>> {
    self
      .data
      .into_iter()
      .enumerate()
      .map(|(i, dto)| dto.into_record(i))
      .collect()
  }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
  DateTime::parse_from_rfc3339(s.trim()).map(|dt| dt.with_timezone(&Utc))
}

// ─── Identity directory ──────────────────────────────────────────────────────

/// Body of `GET /user/abm/{run}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityDto {
  pub external_id: i32,
  pub run:         String,
  pub first_name:  String,
  pub last_name:   String,
}

/// Decode a directory response. An empty body, `null`, or a zero external
/// id means the directory does not know the key.
pub fn parse_identity(body: &[u8]) -> Result<Option<UpstreamIdentity>> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(None);
  }

  let Some(dto) = serde_json::from_slice::<Option<IdentityDto>>(body)? else {
    return Ok(None);
  };
  if dto.external_id == 0 {
    return Ok(None);
  }

  Ok(Some(UpstreamIdentity {
    external_id: dto.external_id,
    natural_key: dto.run,
    first_name:  dto.first_name,
    last_name:   dto.last_name,
  }))
}
