//! In-process delivery queue.
//!
//! [`QueuedDispatcher`] hands events to a bounded channel and returns as soon
//! as they are enqueued. A [`DeliveryWorker`] drains the channel and delivers
//! each event through the wrapped transport. Delivery stays at-most-once:
//! failures are logged and the event is dropped.

use std::sync::Arc;

use spl_core::{dispatch::Dispatcher, notification::NotificationEvent};
use tokio::sync::{Mutex, mpsc, watch};

use crate::error::QueueError;

/// Build a queue of `capacity` events in front of `transport`.
pub fn queue<D: Dispatcher>(
  transport: Arc<D>,
  capacity: usize,
) -> (QueuedDispatcher<D>, DeliveryWorker<D>) {
  let (tx, rx) = mpsc::channel(capacity);
  (
    QueuedDispatcher { tx, transport: transport.clone() },
    DeliveryWorker { rx: Arc::new(Mutex::new(rx)), transport },
  )
}

// ─── Producer ────────────────────────────────────────────────────────────────

pub struct QueuedDispatcher<D> {
  tx:        mpsc::Sender<NotificationEvent>,
  transport: Arc<D>,
}

impl<D> Clone for QueuedDispatcher<D> {
  fn clone(&self) -> Self {
    Self { tx: self.tx.clone(), transport: Arc::clone(&self.transport) }
  }
}

impl<D: Dispatcher> Dispatcher for QueuedDispatcher<D> {
  type Error = QueueError<D::Error>;

  /// Waits for capacity when the queue is full.
  async fn dispatch(
    &self,
    events: Vec<NotificationEvent>,
  ) -> Result<(), Self::Error> {
    let count = events.len();
    for event in events {
      self.tx.send(event).await.map_err(|_| QueueError::Closed)?;
    }
    tracing::debug!(events = count, "enqueued notifications");
    Ok(())
  }

  /// Free text is interactive, so it skips the queue.
  async fn send_message(
    &self,
    chat_id: &str,
    message: &str,
  ) -> Result<(), Self::Error> {
    self
      .transport
      .send_message(chat_id, message)
      .await
      .map_err(QueueError::Transport)
  }
}

// ─── Consumer ────────────────────────────────────────────────────────────────

/// Drains the queue. Cloning shares the same receiver, so a restarted
/// worker picks up where the previous one stopped.
pub struct DeliveryWorker<D> {
  rx:        Arc<Mutex<mpsc::Receiver<NotificationEvent>>>,
  transport: Arc<D>,
}

impl<D> Clone for DeliveryWorker<D> {
  fn clone(&self) -> Self {
    Self { rx: Arc::clone(&self.rx), transport: Arc::clone(&self.transport) }
  }
}

impl<D: Dispatcher> DeliveryWorker<D> {
  /// Deliver until every producer is dropped, or until `shutdown` turns
  /// true. On shutdown, events already enqueued are still delivered.
  pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
    let mut rx = self.rx.lock().await;
    tracing::info!("delivery worker started");

    loop {
      tokio::select! {
        next = rx.recv() => match next {
          Some(event) => self.deliver(event).await,
          None => break,
        },
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            rx.close();
            while let Some(event) = rx.recv().await {
              self.deliver(event).await;
            }
            break;
          }
        }
      }
    }

    tracing::info!("delivery worker stopped");
  }

  async fn deliver(&self, event: NotificationEvent) {
    let kind = event.kind;
    let chat_id = event.chat_id.clone();
    match self.transport.dispatch(vec![event]).await {
      Ok(()) => tracing::debug!(%kind, %chat_id, "notification delivered"),
      Err(e) => tracing::warn!(
        component = "dispatcher",
        %kind,
        %chat_id,
        error = %e,
        "notification dropped"
      ),
    }
  }
}
