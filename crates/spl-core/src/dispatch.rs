//! The `Dispatcher` trait: outbound delivery of notifications and messages.

use std::future::Future;

use crate::notification::NotificationEvent;

/// Delivers notifications to subscribers.
///
/// Delivery is at-most-once: implementations never persist or replay events.
pub trait Dispatcher: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Deliver a batch of events. Every event is attempted even if an earlier
  /// one fails; the error reports the failures.
  fn dispatch(
    &self,
    events: Vec<NotificationEvent>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Send free text to one chat.
  fn send_message<'a>(
    &'a self,
    chat_id: &'a str,
    message: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
