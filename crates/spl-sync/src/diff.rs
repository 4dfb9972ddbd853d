//! Access batch → minimal store updates and notification events.
//!
//! Computes, without touching any collaborator, which tracked identities an
//! access batch changes. The engine applies the result.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use spl_core::{
  access::AccessRecord,
  notification::{NotificationEvent, NotificationKind},
  store::{EntryUpdate, ExitUpdate},
  tracked::TrackedIdentity,
};

/// The result of diffing one access batch against the tracked identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
  /// At most one per external id, in batch order.
  pub entry_updates: Vec<EntryUpdate>,
  /// At most one per external id, in batch order.
  pub exit_updates:  Vec<ExitUpdate>,
  /// One per (subscription, kind): all entries first, then all exits.
  pub events:        Vec<NotificationEvent>,
}

impl ReconcilePlan {
  pub fn is_empty(&self) -> bool {
    self.entry_updates.is_empty()
      && self.exit_updates.is_empty()
      && self.events.is_empty()
  }
}

/// An entry changed unless the stored instant is exactly the reported one.
pub fn entry_changed(last: Option<DateTime<Utc>>, entry: DateTime<Utc>) -> bool {
  last != Some(entry)
}

/// An exit changed when one newly appeared or both exist and differ.
///
/// A stored exit with no reported exit is not a change: the upstream record
/// may simply have been reopened or truncated.
pub fn exit_changed(
  last: Option<DateTime<Utc>>,
  exit: Option<DateTime<Utc>>,
) -> bool {
  match (last, exit) {
    (None, None) | (Some(_), None) => false,
    (None, Some(_)) => true,
    (Some(last), Some(exit)) => last != exit,
  }
}

/// Compute the updates and events that transition `tracked` to `batch`.
///
/// The first record of each external id is authoritative; later duplicates
/// in the same batch are ignored. Identities absent from the batch are never
/// touched.
pub fn plan(batch: &[AccessRecord], tracked: &[TrackedIdentity]) -> ReconcilePlan {
  let mut seen = HashSet::new();
  let mut entry_updates = vec![];
  let mut exit_updates = vec![];
  let mut entry_events = vec![];
  let mut exit_events = vec![];

  for access in batch {
    if !seen.insert(access.external_id) {
      tracing::debug!(
        external_id = access.external_id,
        "ignoring duplicate access record in batch"
      );
      continue;
    }

    let mut entry_hit = false;
    let mut exit_hit = false;

    for t in tracked.iter().filter(|t| t.external_id == access.external_id) {
      if entry_changed(t.last_entry_at, access.entry_at) {
        entry_hit = true;
        entry_events.push(event(NotificationKind::Entry, access.entry_at, t, access));
      }

      if exit_changed(t.last_exit_at, access.exit_at)
        && let Some(exit_at) = access.exit_at
      {
        exit_hit = true;
        exit_events.push(event(NotificationKind::Exit, exit_at, t, access));
      }
    }

    if entry_hit {
      entry_updates.push(EntryUpdate {
        external_id: access.external_id,
        entry_at:    access.entry_at,
      });
    }
    if let (true, Some(exit_at)) = (exit_hit, access.exit_at) {
      exit_updates.push(ExitUpdate { external_id: access.external_id, exit_at });
    }
  }

  entry_events.extend(exit_events);
  ReconcilePlan { entry_updates, exit_updates, events: entry_events }
}

fn event(
  kind: NotificationKind,
  occurred_at: DateTime<Utc>,
  tracked: &TrackedIdentity,
  access: &AccessRecord,
) -> NotificationEvent {
  NotificationEvent {
    kind,
    occurred_at,
    chat_id: tracked.chat_id.clone(),
    natural_key: tracked.natural_key.clone(),
    display_name: tracked.display_name.clone(),
    alias: tracked.alias.clone(),
    location: access.location,
  }
}
