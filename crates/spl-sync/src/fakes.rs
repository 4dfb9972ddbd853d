//! In-memory collaborators for engine and scheduler tests.

use std::sync::{
  Mutex,
  atomic::{AtomicUsize, Ordering},
};

use chrono::{DateTime, TimeZone, Utc};
use spl_core::{
  access::{AccessRecord, LocationCode},
  dispatch::Dispatcher,
  notification::NotificationEvent,
  store::{EntryUpdate, ExitUpdate, TrackStore},
  tracked::{NewTrackedIdentity, TrackedIdentity},
  upstream::AccessSource,
};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fake failure: {0}")]
pub struct FakeError(pub &'static str);

pub fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
}

pub fn tracked(
  id: i64,
  chat: &str,
  external_id: i32,
  last_entry_at: Option<DateTime<Utc>>,
  last_exit_at: Option<DateTime<Utc>>,
) -> TrackedIdentity {
  TrackedIdentity {
    id,
    chat_id: chat.into(),
    external_id,
    natural_key: format!("run-{external_id}"),
    display_name: format!("Name {external_id}"),
    alias: None,
    last_entry_at,
    last_exit_at,
  }
}

pub fn access(
  external_id: i32,
  entry_at: DateTime<Utc>,
  exit_at: Option<DateTime<Utc>>,
) -> AccessRecord {
  AccessRecord {
    external_id,
    natural_key: format!("run-{external_id}"),
    display_name: format!("Name {external_id}"),
    location: LocationCode(104),
    entry_at,
    exit_at,
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeStore {
  pub rows:         Mutex<Vec<TrackedIdentity>>,
  pub entry_calls:  Mutex<Vec<Vec<EntryUpdate>>>,
  pub exit_calls:   Mutex<Vec<Vec<ExitUpdate>>>,
  pub loads:        AtomicUsize,
  pub fail_load:    Option<FakeError>,
  pub fail_entry:   Option<FakeError>,
  pub fail_exit:    Option<FakeError>,
}

impl FakeStore {
  pub fn with(rows: Vec<TrackedIdentity>) -> Self {
    Self { rows: Mutex::new(rows), ..Self::default() }
  }

  pub fn rows(&self) -> Vec<TrackedIdentity> {
    self.rows.lock().unwrap().clone()
  }

  pub fn write_calls(&self) -> usize {
    self.entry_calls.lock().unwrap().len() + self.exit_calls.lock().unwrap().len()
  }
}

impl TrackStore for FakeStore {
  type Error = FakeError;

  async fn get_all(&self) -> Result<Vec<TrackedIdentity>, FakeError> {
    self.loads.fetch_add(1, Ordering::SeqCst);
    match &self.fail_load {
      Some(e) => Err(e.clone()),
      None => Ok(self.rows()),
    }
  }

  async fn get_by_chat(&self, chat_id: &str) -> Result<Vec<TrackedIdentity>, FakeError> {
    Ok(self.rows().into_iter().filter(|t| t.chat_id == chat_id).collect())
  }

  async fn update_entry_at(&self, updates: Vec<EntryUpdate>) -> Result<(), FakeError> {
    self.entry_calls.lock().unwrap().push(updates.clone());
    if let Some(e) = &self.fail_entry {
      return Err(e.clone());
    }
    let mut rows = self.rows.lock().unwrap();
    for u in updates {
      for t in rows.iter_mut().filter(|t| t.external_id == u.external_id) {
        t.last_entry_at = Some(u.entry_at);
      }
    }
    Ok(())
  }

  async fn update_exit_at(&self, updates: Vec<ExitUpdate>) -> Result<(), FakeError> {
    self.exit_calls.lock().unwrap().push(updates.clone());
    if let Some(e) = &self.fail_exit {
      return Err(e.clone());
    }
    let mut rows = self.rows.lock().unwrap();
    for u in updates {
      for t in rows.iter_mut().filter(|t| t.external_id == u.external_id) {
        t.last_exit_at = Some(u.exit_at);
      }
    }
    Ok(())
  }

  async fn create(&self, input: NewTrackedIdentity) -> Result<bool, FakeError> {
    let mut rows = self.rows.lock().unwrap();
    if rows
      .iter()
      .any(|t| t.chat_id == input.chat_id && t.natural_key == input.natural_key)
    {
      return Ok(false);
    }
    let id = rows.iter().map(|t| t.id).max().unwrap_or(0) + 1;
    rows.push(TrackedIdentity {
      id,
      chat_id: input.chat_id,
      external_id: input.external_id,
      natural_key: input.natural_key,
      display_name: input.display_name,
      alias: input.alias,
      last_entry_at: input.last_entry_at,
      last_exit_at: input.last_exit_at,
    });
    Ok(true)
  }

  async fn delete(&self, chat_id: &str, natural_key: &str) -> Result<bool, FakeError> {
    let mut rows = self.rows.lock().unwrap();
    let before = rows.len();
    rows.retain(|t| !(t.chat_id == chat_id && t.natural_key == natural_key));
    Ok(rows.len() < before)
  }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeDispatcher {
  pub batches:  Mutex<Vec<Vec<NotificationEvent>>>,
  pub messages: Mutex<Vec<(String, String)>>,
  pub fail:     Option<FakeError>,
}

impl FakeDispatcher {
  pub fn failing(e: FakeError) -> Self {
    Self { fail: Some(e), ..Self::default() }
  }

  pub fn events(&self) -> Vec<NotificationEvent> {
    self.batches.lock().unwrap().iter().flatten().cloned().collect()
  }
}

impl Dispatcher for FakeDispatcher {
  type Error = FakeError;

  async fn dispatch(&self, events: Vec<NotificationEvent>) -> Result<(), FakeError> {
    self.batches.lock().unwrap().push(events);
    match &self.fail {
      Some(e) => Err(e.clone()),
      None => Ok(()),
    }
  }

  async fn send_message(&self, chat_id: &str, message: &str) -> Result<(), FakeError> {
    self
      .messages
      .lock()
      .unwrap()
      .push((chat_id.to_owned(), message.to_owned()));
    match &self.fail {
      Some(e) => Err(e.clone()),
      None => Ok(()),
    }
  }
}

// ─── Access source ───────────────────────────────────────────────────────────

/// Holds a fetch open until released, to observe overlapping ticks.
#[derive(Default)]
pub struct Gate {
  pub entered: Notify,
  pub release: Notify,
}

pub struct FakeSource {
  pub batch:   Result<Vec<AccessRecord>, FakeError>,
  pub fetches: AtomicUsize,
  pub gate:    Option<Gate>,
}

impl FakeSource {
  pub fn with(batch: Vec<AccessRecord>) -> Self {
    Self { batch: Ok(batch), fetches: AtomicUsize::new(0), gate: None }
  }

  pub fn failing(e: FakeError) -> Self {
    Self { batch: Err(e), fetches: AtomicUsize::new(0), gate: None }
  }

  pub fn fetches(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }
}

impl AccessSource for FakeSource {
  type Error = FakeError;

  async fn fetch_recent(&self) -> Result<Vec<AccessRecord>, FakeError> {
    self.fetches.fetch_add(1, Ordering::SeqCst);
    if let Some(gate) = &self.gate {
      gate.entered.notify_one();
      gate.release.notified().await;
    }
    self.batch.clone()
  }
}
