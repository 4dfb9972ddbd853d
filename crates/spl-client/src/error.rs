//! Error type for `spl-client`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The remote could not be reached or the request timed out.
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("{endpoint} returned {status}")]
  Status {
    endpoint: &'static str,
    status:   StatusCode,
  },

  #[error("malformed response body: {0}")]
  Json(#[from] serde_json::Error),

  /// One field of one upstream access record could not be parsed. The whole
  /// batch is rejected.
  #[error("malformed {field} in access record {index}: {reason}")]
  Parse {
    index:  usize,
    field:  &'static str,
    reason: String,
  },

  #[error("{failed} of {total} notifications failed, first: {first}")]
  Delivery {
    failed: usize,
    total:  usize,
    #[source]
    first:  Box<Error>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
