//! Error types for `spl-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("alias must be between 1 and {max} characters, got {len}")]
  AliasLength { len: usize, max: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
