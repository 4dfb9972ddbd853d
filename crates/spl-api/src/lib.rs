//! HTTP surface of the access-notification service.
//!
//! Exposes an axum [`Router`] over any [`TrackStore`], upstream client, and
//! [`Dispatcher`]. The `spl-server` binary wires the concrete SQLite store,
//! HTTP clients, and delivery queue into it.

pub mod auth;
pub mod config;
pub mod error;
pub mod track;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde_json::{Value, json};
use spl_core::{
  dispatch::Dispatcher,
  store::TrackStore,
  upstream::{AccessSource, IdentityLookup},
};
use tower_http::trace::TraceLayer;

pub use auth::AuthConfig;
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;

/// Both upstream capabilities the subscription handlers need.
pub trait Upstream: AccessSource + IdentityLookup + 'static {}

impl<T: AccessSource + IdentityLookup + 'static> Upstream for T {}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, U, D> {
  pub store:      Arc<S>,
  pub upstream:   Arc<U>,
  pub dispatcher: Arc<D>,
  pub auth:       Arc<AuthConfig>,
}

impl<S, U, D> Clone for AppState<S, U, D> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      upstream:   Arc::clone(&self.upstream),
      dispatcher: Arc::clone(&self.dispatcher),
      auth:       Arc::clone(&self.auth),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the service router. `/health` is the only unauthenticated route.
pub fn router<S, U, D>(state: AppState<S, U, D>) -> Router
where
  S: TrackStore + 'static,
  U: Upstream,
  D: Dispatcher + 'static,
{
  Router::new()
    .route("/health", get(health))
    .route(
      "/track",
      post(track::track::<S, U, D>).delete(track::untrack::<S, U, D>),
    )
    .route("/track/{chat_id}", get(track::list::<S, U, D>))
    .route("/track/send/{chat_id}", get(track::send_list::<S, U, D>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}
