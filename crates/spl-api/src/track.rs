//! Handlers for the `/track` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/track` | Body `{"chatId","run","alias"?}`; 404 if the directory does not know `run` |
//! | `DELETE` | `/track` | Body `{"chatId","run"}`; idempotent |
//! | `GET`    | `/track/{chatId}` | `{"data": [...]}` |
//! | `GET`    | `/track/send/{chatId}` | Sends the list to the chat |
//!
//! Every handler also messages the chat through the dispatcher.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::{Value, json};
use spl_core::{
  dispatch::Dispatcher,
  notification::{
    MSG_TRACK_ADDED, MSG_TRACK_REMOVED, MSG_UNKNOWN_IDENTITY,
    format_track_list,
  },
  store::TrackStore,
  tracked::{NewTrackedIdentity, TrackRequest, TrackedIdentity, UntrackRequest},
};

use crate::{AppState, Upstream, auth::Authenticated, error::ApiError};

// ─── Track ───────────────────────────────────────────────────────────────────

/// `POST /track`
///
/// The new subscription is seeded from the identity's most recent access,
/// so the next poll does not announce an access that happened before the
/// subscription existed.
pub async fn track<S, U, D>(
  _: Authenticated,
  State(state): State<AppState<S, U, D>>,
  body: Result<Json<TrackRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: TrackStore,
  U: Upstream,
  D: Dispatcher,
{
  let Json(req) = body?;
  req.validate()?;

  let identity = state
    .upstream
    .lookup(&req.natural_key)
    .await
    .map_err(ApiError::upstream)?;

  let Some(identity) = identity else {
    if let Err(e) = state
      .dispatcher
      .send_message(&req.chat_id, MSG_UNKNOWN_IDENTITY)
      .await
    {
      tracing::warn!(component = "dispatcher", error = %e, "failed to report unknown identity");
    }
    return Err(ApiError::NotFound(MSG_UNKNOWN_IDENTITY.to_owned()));
  };

  let recent = state
    .upstream
    .fetch_recent()
    .await
    .map_err(ApiError::upstream)?;
  let seed = recent.iter().find(|a| a.external_id == identity.external_id);

  let inserted = state
    .store
    .create(NewTrackedIdentity {
      chat_id:       req.chat_id.clone(),
      external_id:   identity.external_id,
      natural_key:   req.natural_key.clone(),
      display_name:  identity.display_name(),
      alias:         req.alias,
      last_entry_at: seed.map(|a| a.entry_at),
      last_exit_at:  seed.and_then(|a| a.exit_at),
    })
    .await
    .map_err(ApiError::store)?;

  if inserted {
    tracing::info!(chat_id = %req.chat_id, run = %req.natural_key, "subscription created");
  } else {
    tracing::debug!(chat_id = %req.chat_id, run = %req.natural_key, "subscription already exists");
  }

  state
    .dispatcher
    .send_message(&req.chat_id, MSG_TRACK_ADDED)
    .await
    .map_err(ApiError::dispatcher)?;

  Ok(Json(json!({ "message": MSG_TRACK_ADDED })))
}

// ─── Untrack ─────────────────────────────────────────────────────────────────

/// `DELETE /track`
pub async fn untrack<S, U, D>(
  _: Authenticated,
  State(state): State<AppState<S, U, D>>,
  body: Result<Json<UntrackRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: TrackStore,
  U: Upstream,
  D: Dispatcher,
{
  let Json(req) = body?;
  req.validate()?;

  let removed = state
    .store
    .delete(&req.chat_id, &req.natural_key)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(chat_id = %req.chat_id, run = %req.natural_key, removed, "subscription deleted");

  state
    .dispatcher
    .send_message(&req.chat_id, MSG_TRACK_REMOVED)
    .await
    .map_err(ApiError::dispatcher)?;

  Ok(Json(json!({ "message": MSG_TRACK_REMOVED })))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub data: Vec<TrackedIdentity>,
}

/// `GET /track/{chatId}`
pub async fn list<S, U, D>(
  _: Authenticated,
  State(state): State<AppState<S, U, D>>,
  Path(chat_id): Path<String>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: TrackStore,
  U: Upstream,
  D: Dispatcher,
{
  let data = state
    .store
    .get_by_chat(&chat_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ListResponse { data }))
}

/// `GET /track/send/{chatId}`
pub async fn send_list<S, U, D>(
  _: Authenticated,
  State(state): State<AppState<S, U, D>>,
  Path(chat_id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: TrackStore,
  U: Upstream,
  D: Dispatcher,
{
  let tracks = state
    .store
    .get_by_chat(&chat_id)
    .await
    .map_err(ApiError::store)?;
  let message = format_track_list(&tracks);

  state
    .dispatcher
    .send_message(&chat_id, &message)
    .await
    .map_err(ApiError::dispatcher)?;

  Ok(Json(json!({ "message": message })))
}
