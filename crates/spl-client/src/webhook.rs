//! [`WebhookDispatcher`]: delivery through the chat relay's webhooks.
//!
//! | Event | Endpoint |
//! |-------|----------|
//! | entry notification | `POST {base}/webhook/whatsapp/notify-entry` |
//! | exit notification  | `POST {base}/webhook/whatsapp/notify-exit` |
//! | free-text message  | `POST {base}/webhook/whatsapp` |

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use spl_core::{
  dispatch::Dispatcher,
  notification::{NotificationEvent, NotificationKind},
};

use crate::{Error, NotificationConfig, Result, join_url};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateBody<'a> {
  chat_id:   &'a str,
  full_name: &'a str,
  location:  &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageBody<'a> {
  chat_id: &'a str,
  message: &'a str,
}

/// Sends notifications straight to the relay, one request per event.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct WebhookDispatcher {
  client: Client,
  config: NotificationConfig,
}

impl WebhookDispatcher {
  pub fn new(config: NotificationConfig, timeout: Duration) -> Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, config })
  }

  async fn post<T: Serialize + ?Sized>(
    &self,
    endpoint: &'static str,
    path: &str,
    body: &T,
  ) -> Result<()> {
    let resp = self
      .client
      .post(join_url(&self.config.base_url, path))
      .basic_auth(&self.config.username, Some(&self.config.password))
      .json(body)
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status { endpoint, status: resp.status() });
    }
    Ok(())
  }

  /// Deliver one event through its kind's template endpoint.
  pub async fn notify(&self, event: &NotificationEvent) -> Result<()> {
    let path = match event.kind {
      NotificationKind::Entry => "webhook/whatsapp/notify-entry",
      NotificationKind::Exit => "webhook/whatsapp/notify-exit",
    };
    let body = TemplateBody {
      chat_id:   &event.chat_id,
      full_name: &event.display_name,
      location:  event.location.name(),
    };
    self.post("notification webhook", path, &body).await
  }
}

impl Dispatcher for WebhookDispatcher {
  type Error = Error;

  async fn dispatch(&self, events: Vec<NotificationEvent>) -> Result<()> {
    let total = events.len();
    let mut failed = 0usize;
    let mut first: Option<Error> = None;

    for event in &events {
      if let Err(e) = self.notify(event).await {
        tracing::warn!(
          component = "dispatcher",
          kind = %event.kind,
          chat_id = %event.chat_id,
          error = %e,
          "notification delivery failed"
        );
        failed += 1;
        first.get_or_insert(e);
      }
    }

    match first {
      None => Ok(()),
      Some(first) => Err(Error::Delivery { failed, total, first: Box::new(first) }),
    }
  }

  async fn send_message(&self, chat_id: &str, message: &str) -> Result<()> {
    let body = MessageBody { chat_id, message };
    self.post("message webhook", "webhook/whatsapp", &body).await
  }
}
