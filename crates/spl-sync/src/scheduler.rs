//! Periodic fetch → reconcile cycles.
//!
//! At most one cycle runs at a time. A tick that arrives while a cycle is
//! still in flight is skipped, never queued.

use std::{sync::Arc, time::Duration};

use spl_core::{
  dispatch::Dispatcher, store::TrackStore, upstream::AccessSource,
};
use tokio::{
  sync::{Mutex, watch},
  time::MissedTickBehavior,
};
use tracing::Instrument;
use uuid::Uuid;

use crate::engine::{ReconcileReport, Reconciler};

/// How a single tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
  /// A previous cycle was still running.
  Skipped,
  /// The access source returned nothing; the engine was not invoked.
  Idle,
  Completed(ReconcileReport),
  /// The failure was logged; the next tick runs normally.
  Failed,
}

pub struct Scheduler<A, S, D> {
  source:     Arc<A>,
  reconciler: Reconciler<S, D>,
  period:     Duration,
  in_flight:  Mutex<()>,
}

impl<A, S, D> Scheduler<A, S, D>
where
  A: AccessSource,
  S: TrackStore,
  D: Dispatcher,
{
  pub fn new(source: Arc<A>, reconciler: Reconciler<S, D>, period: Duration) -> Self {
    Self { source, reconciler, period, in_flight: Mutex::new(()) }
  }

  /// Run one cycle now, unless one is already running.
  pub async fn tick(&self) -> TickOutcome {
    let Ok(_guard) = self.in_flight.try_lock() else {
      tracing::debug!("previous cycle still running; skipping tick");
      return TickOutcome::Skipped;
    };

    let span = tracing::info_span!("cycle", id = %Uuid::new_v4());
    self.cycle().instrument(span).await
  }

  async fn cycle(&self) -> TickOutcome {
    let batch = match self.source.fetch_recent().await {
      Ok(batch) => batch,
      Err(e) => {
        tracing::error!(component = "fetcher", error = %e, "fetching recent accesses failed");
        return TickOutcome::Failed;
      }
    };

    if batch.is_empty() {
      tracing::debug!("access source returned no records");
      return TickOutcome::Idle;
    }

    match self.reconciler.reconcile(&batch).await {
      Ok(report) => TickOutcome::Completed(report),
      Err(e) => {
        tracing::error!(component = e.component(), error = %e, "reconciliation failed");
        TickOutcome::Failed
      }
    }
  }

  /// Tick every period until `shutdown` turns true or its sender is dropped.
  ///
  /// Shutdown is only observed between cycles; a running cycle completes.
  pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(self.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tracing::info!(period_ms = self.period.as_millis() as u64, "scheduler started");

    while !*shutdown.borrow() {
      tokio::select! {
        _ = ticker.tick() => {
          self.tick().await;
        }
        changed = shutdown.changed() => {
          if changed.is_err() {
            break;
          }
        }
      }
    }

    tracing::info!("scheduler stopped");
  }
}
