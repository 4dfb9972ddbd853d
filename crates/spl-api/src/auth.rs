//! Shared-token authentication for the `/track` routes.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use subtle::ConstantTimeEq;

use crate::{AppState, error::ApiError};

pub const AUTH_HEADER: &str = "x-auth-token";

/// The token callers must present.
#[derive(Clone)]
pub struct AuthConfig {
  pub token: String,
}

/// Zero-size marker: present in the handler means the request was authenticated.
pub struct Authenticated;

/// Check `X-Auth-Token` against the configured token. An empty configured
/// token rejects everything.
pub fn verify_token(headers: &HeaderMap, config: &AuthConfig) -> Result<(), ApiError> {
  let presented = headers
    .get(AUTH_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let matches: bool = presented.as_bytes().ct_eq(config.token.as_bytes()).into();
  if config.token.is_empty() || !matches {
    return Err(ApiError::Unauthorized);
  }
  Ok(())
}

impl<S, U, D> FromRequestParts<AppState<S, U, D>> for Authenticated
where
  S: Send + Sync,
  U: Send + Sync,
  D: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, U, D>,
  ) -> Result<Self, Self::Rejection> {
    verify_token(&parts.headers, &state.auth)?;
    Ok(Authenticated)
  }
}
