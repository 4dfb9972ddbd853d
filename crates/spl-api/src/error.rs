//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("malformed body: {0}")]
  Malformed(#[from] JsonRejection),

  #[error(transparent)]
  Invalid(#[from] spl_core::Error),

  #[error("not found: {0}")]
  NotFound(String),

  /// A collaborator failed. Logged with its component; the client only sees
  /// a generic message.
  #[error("{component} error: {source}")]
  Internal {
    component: &'static str,
    #[source]
    source:    BoxError,
  },
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal { component: "store", source: Box::new(e) }
  }

  pub fn upstream(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal { component: "upstream", source: Box::new(e) }
  }

  pub fn dispatcher(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Internal { component: "dispatcher", source: Box::new(e) }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::Malformed(_) | ApiError::Invalid(_) => {
        (StatusCode::BAD_REQUEST, self.to_string())
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Internal { component, source } => {
        tracing::error!(component, error = %source, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
