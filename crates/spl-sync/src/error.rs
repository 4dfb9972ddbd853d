//! Errors raised by a reconciliation cycle and by the delivery queue.

use thiserror::Error;

/// Failure of one reconciliation cycle, carrying the collaborator's own error.
#[derive(Debug, Error)]
pub enum EngineError<S, D> {
  /// Loading the tracked identities or persisting an update failed. No
  /// notification was emitted.
  #[error("store: {0}")]
  Store(#[source] S),

  /// State was already committed when delivery failed. Nothing is rolled
  /// back; the same changes will not be re-detected next cycle.
  #[error("dispatch: {0}")]
  Dispatch(#[source] D),
}

impl<S, D> EngineError<S, D> {
  /// Log tag for the collaborator that failed.
  pub fn component(&self) -> &'static str {
    match self {
      Self::Store(_) => "store",
      Self::Dispatch(_) => "dispatcher",
    }
  }
}

/// Failure of the queued dispatcher.
#[derive(Debug, Error)]
pub enum QueueError<E> {
  /// The delivery worker is gone; the event was not enqueued.
  #[error("delivery queue is closed")]
  Closed,

  #[error(transparent)]
  Transport(E),
}
