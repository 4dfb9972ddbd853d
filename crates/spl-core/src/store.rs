//! The `TrackStore` trait and its update payloads.
//!
//! The trait is implemented by storage backends (e.g. `spl-store-sqlite`).
//! The engine and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::tracked::{NewTrackedIdentity, TrackedIdentity};

// ─── Update payloads ─────────────────────────────────────────────────────────

/// Move `last_entry_at` of every subscription to `external_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryUpdate {
  pub external_id: i32,
  pub entry_at:    DateTime<Utc>,
}

/// Move `last_exit_at` of every subscription to `external_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitUpdate {
  pub external_id: i32,
  pub exit_at:     DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Persistence for tracked identities.
///
/// Each method is its own transaction. The two bulk updates are atomic: on
/// failure no row of the batch is observably written.
///
/// All methods return `Send` futures so the trait can be used from spawned
/// tokio tasks and axum handlers.
pub trait TrackStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every subscription of every chat. No pagination.
  fn get_all(
    &self,
  ) -> impl Future<Output = Result<Vec<TrackedIdentity>, Self::Error>> + Send + '_;

  /// The subscriptions of one chat, oldest first.
  fn get_by_chat<'a>(
    &'a self,
    chat_id: &'a str,
  ) -> impl Future<Output = Result<Vec<TrackedIdentity>, Self::Error>> + Send + 'a;

  /// Apply all entry updates in a single transaction.
  fn update_entry_at(
    &self,
    updates: Vec<EntryUpdate>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Apply all exit updates in a single transaction, independent of
  /// [`TrackStore::update_entry_at`].
  fn update_exit_at(
    &self,
    updates: Vec<ExitUpdate>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert a subscription unless `(chat_id, natural_key)` already exists.
  /// Returns `true` if a row was inserted; a duplicate is not an error.
  fn create(
    &self,
    input: NewTrackedIdentity,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Hard-delete a subscription. Returns `true` if a row was removed;
  /// deleting a missing subscription is not an error.
  fn delete<'a>(
    &'a self,
    chat_id: &'a str,
    natural_key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
