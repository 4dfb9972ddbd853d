//! Error type for `spl-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error in column {column}: {reason}")]
  DateParse { column: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
