//! [`SqliteStore`]: the SQLite implementation of [`TrackStore`].

use std::path::Path;

use chrono::Utc;
use spl_core::{
  store::{EntryUpdate, ExitUpdate, TrackStore},
  tracked::{NewTrackedIdentity, TrackedIdentity},
};

use crate::{
  Result,
  encode::{RawTrackedIdentity, TRACKED_COLUMNS, encode_dt},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tracked-identity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection {
    &self.conn
  }

  /// Run `SELECT … FROM tracked_identities {filter}` and decode the rows.
  async fn select(
    &self,
    filter: &'static str,
    chat_id: Option<String>,
  ) -> Result<Vec<TrackedIdentity>> {
    let raws: Vec<RawTrackedIdentity> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {TRACKED_COLUMNS} FROM tracked_identities {filter} ORDER BY id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = match chat_id {
          Some(chat) => stmt
            .query_map(rusqlite::params![chat], RawTrackedIdentity::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
          None => stmt
            .query_map([], RawTrackedIdentity::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTrackedIdentity::into_tracked).collect()
  }

  /// Set `column` for every row of each external id, in one transaction.
  ///
  /// Any failure drops the transaction before commit, which rolls back the
  /// rows already written.
  async fn update_column(
    &self,
    column: &'static str,
    values: Vec<(i32, String)>,
  ) -> Result<()> {
    if values.is_empty() {
      return Ok(());
    }

    let touched = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut touched = 0usize;
        {
          let sql = format!(
            "UPDATE tracked_identities
             SET {column} = ?1, updated_at = ?2
             WHERE external_id = ?3"
          );
          let mut stmt = tx.prepare(&sql)?;
          let now = encode_dt(Utc::now());
          for (external_id, at) in &values {
            touched += stmt.execute(rusqlite::params![at, now, external_id])?;
          }
        }
        tx.commit()?;
        Ok(touched)
      })
      .await?;

    tracing::debug!(column, rows = touched, "updated tracked identities");
    Ok(())
  }
}

// ─── TrackStore impl ─────────────────────────────────────────────────────────

impl TrackStore for SqliteStore {
  type Error = crate::Error;

  async fn get_all(&self) -> Result<Vec<TrackedIdentity>> {
    self.select("", None).await
  }

  async fn get_by_chat(&self, chat_id: &str) -> Result<Vec<TrackedIdentity>> {
    self.select("WHERE chat_id = ?1", Some(chat_id.to_owned())).await
  }

  async fn update_entry_at(&self, updates: Vec<EntryUpdate>) -> Result<()> {
    let values = updates
      .into_iter()
      .map(|u| (u.external_id, encode_dt(u.entry_at)))
      .collect();
    self.update_column("last_entry_at", values).await
  }

  async fn update_exit_at(&self, updates: Vec<ExitUpdate>) -> Result<()> {
    let values = updates
      .into_iter()
      .map(|u| (u.external_id, encode_dt(u.exit_at)))
      .collect();
    self.update_column("last_exit_at", values).await
  }

  async fn create(&self, input: NewTrackedIdentity) -> Result<bool> {
    let now        = encode_dt(Utc::now());
    let last_entry = input.last_entry_at.map(encode_dt);
    let last_exit  = input.last_exit_at.map(encode_dt);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO tracked_identities (
             chat_id, external_id, natural_key, display_name, alias,
             last_entry_at, last_exit_at, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
           ON CONFLICT (chat_id, natural_key) DO NOTHING",
          rusqlite::params![
            input.chat_id,
            input.external_id,
            input.natural_key,
            input.display_name,
            input.alias,
            last_entry,
            last_exit,
            now,
          ],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(inserted)
  }

  async fn delete(&self, chat_id: &str, natural_key: &str) -> Result<bool> {
    let chat_id     = chat_id.to_owned();
    let natural_key = natural_key.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM tracked_identities WHERE chat_id = ?1 AND natural_key = ?2",
          rusqlite::params![chat_id, natural_key],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(removed)
  }
}
