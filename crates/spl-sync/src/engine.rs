//! The reconciliation engine.

use std::sync::Arc;

use spl_core::{
  access::AccessRecord, dispatch::Dispatcher, store::TrackStore,
};

use crate::{diff, error::EngineError};

/// What one successful cycle changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
  pub entry_updates: usize,
  pub exit_updates:  usize,
  pub events:        usize,
}

/// Applies access batches to the store and notifies subscribers.
///
/// Within a cycle, state is committed before any notification is emitted,
/// and no notification is emitted unless every attempted update committed.
pub struct Reconciler<S, D> {
  store:      Arc<S>,
  dispatcher: Arc<D>,
}

impl<S, D> Clone for Reconciler<S, D> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      dispatcher: Arc::clone(&self.dispatcher),
    }
  }
}

impl<S, D> Reconciler<S, D>
where
  S: TrackStore,
  D: Dispatcher,
{
  pub fn new(store: Arc<S>, dispatcher: Arc<D>) -> Self {
    Self { store, dispatcher }
  }

  /// Run one cycle over `batch`.
  ///
  /// Both update kinds are attempted even if the first fails, since they are
  /// independent transactions. If either fails the cycle emits nothing and
  /// reports the store's error (the entry error when both fail).
  pub async fn reconcile(
    &self,
    batch: &[AccessRecord],
  ) -> Result<ReconcileReport, EngineError<S::Error, D::Error>> {
    let tracked = self.store.get_all().await.map_err(EngineError::Store)?;
    let plan = diff::plan(batch, &tracked);

    let report = ReconcileReport {
      entry_updates: plan.entry_updates.len(),
      exit_updates:  plan.exit_updates.len(),
      events:        plan.events.len(),
    };

    let entry_result = if plan.entry_updates.is_empty() {
      Ok(())
    } else {
      self.store.update_entry_at(plan.entry_updates).await
    };
    let exit_result = if plan.exit_updates.is_empty() {
      Ok(())
    } else {
      self.store.update_exit_at(plan.exit_updates).await
    };

    match (entry_result, exit_result) {
      (Ok(()), Ok(())) => {}
      (Err(e), exit) => {
        if exit.is_ok() && report.exit_updates > 0 {
          tracing::warn!(
            exit_updates = report.exit_updates,
            "exit updates committed but their notifications are suppressed"
          );
        }
        return Err(EngineError::Store(e));
      }
      (Ok(()), Err(e)) => {
        if report.entry_updates > 0 {
          tracing::warn!(
            entry_updates = report.entry_updates,
            "entry updates committed but their notifications are suppressed"
          );
        }
        return Err(EngineError::Store(e));
      }
    }

    if plan.events.is_empty() {
      tracing::debug!(records = batch.len(), "no changes detected");
      return Ok(report);
    }

    self
      .dispatcher
      .dispatch(plan.events)
      .await
      .map_err(EngineError::Dispatch)?;

    tracing::info!(
      entry_updates = report.entry_updates,
      exit_updates = report.exit_updates,
      events = report.events,
      "reconciled access batch"
    );
    Ok(report)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use spl_core::{notification::NotificationKind, store::EntryUpdate};

  use super::*;
  use crate::fakes::{
    FakeDispatcher, FakeError, FakeStore, access, t0, tracked,
  };

  fn engine(
    store: FakeStore,
    dispatcher: FakeDispatcher,
  ) -> (Reconciler<FakeStore, FakeDispatcher>, Arc<FakeStore>, Arc<FakeDispatcher>) {
    let store = Arc::new(store);
    let dispatcher = Arc::new(dispatcher);
    (
      Reconciler::new(store.clone(), dispatcher.clone()),
      store,
      dispatcher,
    )
  }

  // ─── Detection ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_entry_is_persisted_and_notified() {
    let (r, store, disp) =
      engine(FakeStore::with(vec![tracked(1, "c", 10, None, None)]), FakeDispatcher::default());

    let report = r.reconcile(&[access(10, t0(), None)]).await.unwrap();

    assert_eq!(report, ReconcileReport { entry_updates: 1, exit_updates: 0, events: 1 });
    assert_eq!(store.rows()[0].last_entry_at, Some(t0()));
    let events = disp.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::Entry);
    assert_eq!(events[0].occurred_at, t0());
  }

  #[tokio::test]
  async fn unchanged_entry_is_silent() {
    let (r, store, disp) = engine(
      FakeStore::with(vec![tracked(1, "c", 10, Some(t0()), None)]),
      FakeDispatcher::default(),
    );

    let report = r.reconcile(&[access(10, t0(), None)]).await.unwrap();

    assert_eq!(report, ReconcileReport::default());
    assert_eq!(store.write_calls(), 0);
    assert!(disp.batches.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn new_exit_is_persisted_and_notified() {
    let exit = t0() + Duration::minutes(40);
    let (r, store, disp) = engine(
      FakeStore::with(vec![tracked(1, "c", 10, Some(t0()), None)]),
      FakeDispatcher::default(),
    );

    r.reconcile(&[access(10, t0(), Some(exit))]).await.unwrap();

    let row = &store.rows()[0];
    assert_eq!(row.last_entry_at, Some(t0()));
    assert_eq!(row.last_exit_at, Some(exit));
    let events = disp.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::Exit);
    assert_eq!(events[0].occurred_at, exit);
  }

  #[tokio::test]
  async fn missing_exit_does_not_clear_stored_exit() {
    let exit = t0() + Duration::minutes(40);
    let (r, store, disp) = engine(
      FakeStore::with(vec![tracked(1, "c", 10, Some(t0()), Some(exit))]),
      FakeDispatcher::default(),
    );

    r.reconcile(&[access(10, t0(), None)]).await.unwrap();

    assert_eq!(store.rows()[0].last_exit_at, Some(exit));
    assert!(disp.events().is_empty());
  }

  #[tokio::test]
  async fn later_entry_without_exit_touches_only_the_entry() {
    let entry = t0() + Duration::hours(1);
    let (r, store, disp) = engine(
      FakeStore::with(vec![tracked(1, "c", 10, Some(t0()), None)]),
      FakeDispatcher::default(),
    );

    let report = r.reconcile(&[access(10, entry, None)]).await.unwrap();

    assert_eq!(report, ReconcileReport { entry_updates: 1, exit_updates: 0, events: 1 });
    assert_eq!(
      *store.entry_calls.lock().unwrap(),
      vec![vec![EntryUpdate { external_id: 10, entry_at: entry }]]
    );
    assert!(store.exit_calls.lock().unwrap().is_empty());
    let row = &store.rows()[0];
    assert_eq!(row.last_entry_at, Some(entry));
    assert_eq!(row.last_exit_at, None);
    let events = disp.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::Entry);
    assert_eq!(events[0].occurred_at, entry);
  }

  #[tokio::test]
  async fn new_visit_emits_entry_then_exit() {
    let old_exit = t0() + Duration::minutes(40);
    let entry = t0() + Duration::hours(3);
    let exit = entry + Duration::minutes(10);
    let (r, _store, disp) = engine(
      FakeStore::with(vec![tracked(1, "c", 10, Some(t0()), Some(old_exit))]),
      FakeDispatcher::default(),
    );

    r.reconcile(&[access(10, entry, Some(exit))]).await.unwrap();

    let kinds: Vec<_> = disp.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![NotificationKind::Entry, NotificationKind::Exit]);
  }

  #[tokio::test]
  async fn every_subscription_is_notified() {
    let (r, store, disp) = engine(
      FakeStore::with(vec![
        tracked(1, "chat-a", 10, None, None),
        tracked(2, "chat-b", 10, None, None),
        tracked(3, "chat-c", 20, None, None),
      ]),
      FakeDispatcher::default(),
    );

    r.reconcile(&[access(10, t0(), None)]).await.unwrap();

    let chats: Vec<_> = disp.events().into_iter().map(|e| e.chat_id).collect();
    assert_eq!(chats, vec!["chat-a", "chat-b"]);
    assert_eq!(store.entry_calls.lock().unwrap()[0].len(), 1);
    assert_eq!(store.rows()[2].last_entry_at, None);
  }

  #[tokio::test]
  async fn all_events_go_out_in_one_dispatch() {
    let (r, _store, disp) = engine(
      FakeStore::with(vec![
        tracked(1, "c", 10, None, None),
        tracked(2, "c", 20, None, None),
      ]),
      FakeDispatcher::default(),
    );

    r.reconcile(&[access(10, t0(), None), access(20, t0(), None)])
      .await
      .unwrap();

    assert_eq!(disp.batches.lock().unwrap().len(), 1);
  }

  // ─── Idempotence and empty inputs ──────────────────────────────────────────

  #[tokio::test]
  async fn second_run_of_the_same_batch_is_silent() {
    let exit = t0() + Duration::minutes(5);
    let (r, store, disp) = engine(
      FakeStore::with(vec![
        tracked(1, "c", 10, None, None),
        tracked(2, "d", 20, Some(t0()), None),
      ]),
      FakeDispatcher::default(),
    );
    let batch = [access(10, t0(), None), access(20, t0(), Some(exit))];

    r.reconcile(&batch).await.unwrap();
    let after_first = store.rows();
    let sent = disp.events().len();

    let report = r.reconcile(&batch).await.unwrap();

    assert_eq!(report, ReconcileReport::default());
    assert_eq!(store.rows(), after_first);
    assert_eq!(disp.events().len(), sent);
  }

  #[tokio::test]
  async fn empty_batch_is_a_no_op() {
    let (r, store, disp) = engine(
      FakeStore::with(vec![tracked(1, "c", 10, None, None)]),
      FakeDispatcher::default(),
    );

    assert_eq!(r.reconcile(&[]).await.unwrap(), ReconcileReport::default());
    assert_eq!(store.write_calls(), 0);
    assert!(disp.batches.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn no_subscriptions_is_a_no_op() {
    let (r, store, disp) = engine(FakeStore::default(), FakeDispatcher::default());

    assert_eq!(
      r.reconcile(&[access(10, t0(), Some(t0()))]).await.unwrap(),
      ReconcileReport::default()
    );
    assert_eq!(store.write_calls(), 0);
    assert!(disp.batches.lock().unwrap().is_empty());
  }

  // ─── Failures ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn load_failure_is_a_store_error() {
    let store = FakeStore { fail_load: Some(FakeError("load")), ..FakeStore::default() };
    let (r, _store, disp) = engine(store, FakeDispatcher::default());

    let err = r.reconcile(&[access(10, t0(), None)]).await.unwrap_err();

    assert!(matches!(err, EngineError::Store(FakeError("load"))));
    assert!(disp.batches.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn entry_update_failure_suppresses_every_notification() {
    let exit = t0() + Duration::minutes(5);
    let store = FakeStore {
      fail_entry: Some(FakeError("entry")),
      ..FakeStore::with(vec![
        tracked(1, "c", 10, None, None),
        tracked(2, "c", 20, Some(t0()), None),
      ])
    };
    let (r, store, disp) = engine(store, FakeDispatcher::default());

    let err = r
      .reconcile(&[access(10, t0(), None), access(20, t0(), Some(exit))])
      .await
      .unwrap_err();

    assert!(matches!(&err, EngineError::Store(e) if *e == FakeError("entry")));
    assert_eq!(err.component(), "store");
    assert!(disp.batches.lock().unwrap().is_empty());
    // The exit update is still attempted and committed.
    assert_eq!(store.exit_calls.lock().unwrap().len(), 1);
    assert_eq!(store.rows()[1].last_exit_at, Some(exit));
  }

  #[tokio::test]
  async fn exit_update_failure_suppresses_every_notification() {
    let exit = t0() + Duration::minutes(5);
    let store = FakeStore {
      fail_exit: Some(FakeError("exit")),
      ..FakeStore::with(vec![
        tracked(1, "c", 10, None, None),
        tracked(2, "c", 20, Some(t0()), None),
      ])
    };
    let (r, _store, disp) = engine(store, FakeDispatcher::default());

    let err = r
      .reconcile(&[access(10, t0(), None), access(20, t0(), Some(exit))])
      .await
      .unwrap_err();

    assert!(matches!(err, EngineError::Store(FakeError("exit"))));
    assert!(disp.batches.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn entry_error_wins_when_both_updates_fail() {
    let store = FakeStore {
      fail_entry: Some(FakeError("entry")),
      fail_exit: Some(FakeError("exit")),
      ..FakeStore::with(vec![tracked(1, "c", 10, None, None)])
    };
    let (r, _store, _disp) = engine(store, FakeDispatcher::default());

    let err = r
      .reconcile(&[access(10, t0(), Some(t0() + Duration::minutes(1)))])
      .await
      .unwrap_err();

    assert!(matches!(err, EngineError::Store(FakeError("entry"))));
  }

  #[tokio::test]
  async fn dispatch_failure_keeps_committed_state() {
    let (r, store, _disp) = engine(
      FakeStore::with(vec![tracked(1, "c", 10, None, None)]),
      FakeDispatcher::failing(FakeError("relay")),
    );

    let err = r.reconcile(&[access(10, t0(), None)]).await.unwrap_err();

    assert!(matches!(err, EngineError::Dispatch(FakeError("relay"))));
    assert_eq!(err.component(), "dispatcher");
    assert_eq!(store.rows()[0].last_entry_at, Some(t0()));

    // The change is not re-detected on the next cycle.
    let (r, _store, disp) = engine(FakeStore::with(store.rows()), FakeDispatcher::default());
    r.reconcile(&[access(10, t0(), None)]).await.unwrap();
    assert!(disp.events().is_empty());
  }
}
