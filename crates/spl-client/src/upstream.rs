//! [`UpstreamClient`]: the recent-access feed and the identity directory.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use spl_core::{
  access::AccessRecord,
  upstream::{AccessSource, IdentityLookup, UpstreamIdentity},
};

use crate::{
  AccessConfig, Error, IdentityConfig, Result,
  dto::{RecentAccessResponse, parse_identity},
  join_url,
};

/// Async client for both upstream services.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct UpstreamClient {
  client:   Client,
  access:   AccessConfig,
  identity: IdentityConfig,
}

impl UpstreamClient {
  pub fn new(
    access: AccessConfig,
    identity: IdentityConfig,
    timeout: Duration,
  ) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, access, identity })
  }

  /// `GET {access}/api/access/recently`
  pub async fn recent_accesses(&self) -> Result<Vec<AccessRecord>> {
    let resp = self
      .client
      .get(join_url(&self.access.base_url, "api/access/recently"))
      .header("X-Auth-Token", &self.access.auth_token)
      .send()
      .await?;

    if resp.status() != StatusCode::OK {
      return Err(Error::Status {
        endpoint: "access feed",
        status:   resp.status(),
      });
    }

    let bytes = resp.bytes().await?;
    let body: RecentAccessResponse = serde_json::from_slice(&bytes)?;
    let records = body.into_records()?;
    tracing::debug!(records = records.len(), "fetched recent accesses");
    Ok(records)
  }

  /// `GET {identity}/user/abm/{natural_key}`
  ///
  /// The key is sent as a single escaped path segment. A key made only of
  /// dots cannot be expressed as a segment and is never a known identity.
  pub async fn identity(
    &self,
    natural_key: &str,
  ) -> Result<Option<UpstreamIdentity>> {
    if natural_key.chars().all(|c| c == '.') {
      return Ok(None);
    }
    let path = format!("user/abm/{}", urlencoding::encode(natural_key));
    let resp = self
      .client
      .get(join_url(&self.identity.base_url, &path))
      .header("X-Auth-String", &self.identity.auth_string)
      .send()
      .await?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      return Err(Error::Status { endpoint: "identity directory", status });
    }

    let body = resp.bytes().await?;
    parse_identity(&body)
  }
}

impl AccessSource for UpstreamClient {
  type Error = Error;

  async fn fetch_recent(&self) -> Result<Vec<AccessRecord>> {
    self.recent_accesses().await
  }
}

impl IdentityLookup for UpstreamClient {
  type Error = Error;

  async fn lookup(&self, natural_key: &str) -> Result<Option<UpstreamIdentity>> {
    self.identity(natural_key).await
  }
}
