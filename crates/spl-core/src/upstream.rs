//! Traits for the two upstream services: the access feed and the identity
//! directory.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::access::AccessRecord;

/// An identity as known to the upstream directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamIdentity {
  pub external_id: i32,
  pub natural_key: String,
  pub first_name:  String,
  pub last_name:   String,
}

impl UpstreamIdentity {
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Source of the most recent access records.
pub trait AccessSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The current batch. A single malformed record fails the whole batch.
  fn fetch_recent(
    &self,
  ) -> impl Future<Output = Result<Vec<AccessRecord>, Self::Error>> + Send + '_;
}

/// Resolves natural keys to upstream identities.
pub trait IdentityLookup: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `Ok(None)` when the directory does not know the key.
  fn lookup<'a>(
    &'a self,
    natural_key: &'a str,
  ) -> impl Future<Output = Result<Option<UpstreamIdentity>, Self::Error>> + Send + 'a;
}
