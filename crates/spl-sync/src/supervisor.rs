//! Restart-on-panic supervision for long-running background tasks.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;

/// Respawns a task whenever it panics, with exponential backoff.
///
/// A task that returns normally is not restarted; returning is how the
/// scheduler and the delivery worker acknowledge shutdown.
#[derive(Debug, Clone)]
pub struct Supervisor {
  name:            &'static str,
  initial_backoff: Duration,
  max_backoff:     Duration,
}

impl Supervisor {
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      initial_backoff: Duration::from_secs(1),
      max_backoff: Duration::from_secs(60),
    }
  }

  pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
    self.initial_backoff = initial;
    self.max_backoff = max;
    self
  }

  /// Delay before the `restarts`-th restart (1-based): doubles each time,
  /// capped at the maximum.
  pub fn backoff(&self, restarts: u32) -> Duration {
    let factor = 2u32.saturating_pow(restarts.saturating_sub(1));
    self
      .initial_backoff
      .checked_mul(factor)
      .map_or(self.max_backoff, |d| d.min(self.max_backoff))
  }

  /// Spawn `factory()` and keep it running.
  pub fn spawn<F, Fut>(self, mut factory: F) -> JoinHandle<()>
  where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    tokio::spawn(async move {
      let mut restarts = 0u32;
      loop {
        match tokio::spawn(factory()).await {
          Ok(()) => {
            tracing::info!(task = self.name, "task exited");
            break;
          }
          Err(e) if e.is_panic() => {
            restarts += 1;
            let delay = self.backoff(restarts);
            tracing::error!(
              task = self.name,
              restarts,
              backoff_ms = delay.as_millis() as u64,
              "task panicked; restarting"
            );
            tokio::time::sleep(delay).await;
          }
          Err(e) => {
            tracing::warn!(task = self.name, error = %e, "task cancelled");
            break;
          }
        }
      }
    })
  }
}

/// [`Supervisor::spawn`] with the default backoff.
pub fn spawn_supervised<F, Fut>(name: &'static str, factory: F) -> JoinHandle<()>
where
  F: FnMut() -> Fut + Send + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  Supervisor::new(name).spawn(factory)
}
