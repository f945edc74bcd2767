//! In-process remote store used by tests and offline tooling

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{InterruptRow, RemoteSnapshot, RemoteStore, SessionRow};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::sync::SyncCounts;

type NaturalKey = (String, String);

#[derive(Debug, Default)]
struct Tables {
    sessions: BTreeMap<NaturalKey, Value>,
    interrupts: BTreeMap<NaturalKey, Value>,
    next_surrogate_id: u64,
    failure: Option<String>,
}

/// Identity-scoped tables with the same natural-key upsert semantics as the
/// hosted store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteStore {
    tables: Arc<Mutex<Tables>>,
    fetch_calls: Arc<AtomicUsize>,
    upsert_calls: Arc<AtomicUsize>,
}

impl InMemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail with `message`, or succeed again on `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.failure = message.map(str::to_string);
        }
    }

    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Number of stored rows per table for `user_id`.
    #[must_use]
    pub fn row_counts(&self, user_id: &str) -> SyncCounts {
        let Ok(tables) = self.tables.lock() else {
            return SyncCounts::default();
        };
        SyncCounts {
            sessions: tables.sessions.keys().filter(|(user, _)| user == user_id).count(),
            interrupts: tables
                .interrupts
                .keys()
                .filter(|(user, _)| user == user_id)
                .count(),
        }
    }

    /// Insert a session row as another client would, bypassing the natural
    /// key. A surrogate `id` is assigned when the row has none.
    pub fn insert_raw_session(&self, user_id: &str, row: Value) -> Result<()> {
        let mut tables = self.lock()?;
        let row = tables.with_surrogate_id(user_id, row);
        let key = (user_id.to_string(), raw_key(&row));
        tables.sessions.insert(key, row);
        Ok(())
    }

    pub fn insert_raw_interrupt(&self, user_id: &str, row: Value) -> Result<()> {
        let mut tables = self.lock()?;
        let row = tables.with_surrogate_id(user_id, row);
        let key = (user_id.to_string(), raw_key(&row));
        tables.interrupts.insert(key, row);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        let tables = self
            .tables
            .lock()
            .map_err(|_| Error::Remote("remote tables lock poisoned".to_string()))?;
        if let Some(message) = &tables.failure {
            return Err(Error::Remote(message.clone()));
        }
        Ok(tables)
    }
}

impl Tables {
    fn with_surrogate_id(&mut self, user_id: &str, mut row: Value) -> Value {
        if let Value::Object(fields) = &mut row {
            fields.insert("user_id".to_string(), Value::String(user_id.to_string()));
            if !fields.contains_key("id") {
                self.next_surrogate_id += 1;
                fields.insert("id".to_string(), Value::from(self.next_surrogate_id));
            }
        }
        row
    }

    fn upsert_rows<T: Serialize>(
        &mut self,
        user_id: &str,
        rows: &[T],
        select: fn(&mut Self) -> &mut BTreeMap<NaturalKey, Value>,
    ) -> Result<usize> {
        for row in rows {
            let mut value = serde_json::to_value(row)?;
            let local_id = value
                .get("local_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let key = (user_id.to_string(), local_id);

            let existing_id = select(self).get(&key).and_then(|row| row.get("id").cloned());
            let surrogate = match existing_id {
                Some(id) => id,
                None => {
                    self.next_surrogate_id += 1;
                    Value::from(self.next_surrogate_id)
                }
            };
            if let Value::Object(fields) = &mut value {
                fields.insert("id".to_string(), surrogate);
            }
            select(self).insert(key, value);
        }
        Ok(rows.len())
    }
}

fn sessions_table(tables: &mut Tables) -> &mut BTreeMap<NaturalKey, Value> {
    &mut tables.sessions
}

fn interrupts_table(tables: &mut Tables) -> &mut BTreeMap<NaturalKey, Value> {
    &mut tables.interrupts
}

fn raw_key(row: &Value) -> String {
    match (row.get("local_id"), row.get("id")) {
        (Some(Value::String(local_id)), _) => local_id.clone(),
        (_, Some(id)) => format!("#{id}"),
        _ => String::new(),
    }
}

fn scoped_rows<T: DeserializeOwned>(
    rows: &BTreeMap<NaturalKey, Value>,
    user_id: &str,
    order_field: &str,
    table: &str,
) -> Result<Vec<T>> {
    let mut scoped: Vec<&Value> = rows
        .iter()
        .filter(|((user, _), _)| user == user_id)
        .map(|(_, row)| row)
        .collect();
    scoped.sort_by(|left, right| {
        let left = left.get(order_field).and_then(Value::as_str);
        let right = right.get(order_field).and_then(Value::as_str);
        right.cmp(&left)
    });

    scoped
        .into_iter()
        .map(|row| {
            serde_json::from_value(row.clone())
                .map_err(|error| Error::Remote(format!("unrecognized {table} row: {error}")))
        })
        .collect()
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_all(&self, identity: &Identity) -> Result<RemoteSnapshot> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let tables = self.lock()?;
        Ok(RemoteSnapshot {
            sessions: scoped_rows(&tables.sessions, &identity.user_id, "ended_at", "sessions")?,
            interrupts: scoped_rows(&tables.interrupts, &identity.user_id, "at", "interrupts")?,
        })
    }

    async fn upsert(
        &self,
        identity: &Identity,
        sessions: &[SessionRow],
        interrupts: &[InterruptRow],
    ) -> Result<SyncCounts> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.lock()?;
        Ok(SyncCounts {
            sessions: tables.upsert_rows(&identity.user_id, sessions, sessions_table)?,
            interrupts: tables.upsert_rows(&identity.user_id, interrupts, interrupts_table)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::models::{Interrupt, InterruptOutcome};

    fn interrupt_rows(user_id: &str) -> Vec<InterruptRow> {
        let at = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let interrupt = Interrupt::new(at, None, false, InterruptOutcome::Quit);
        vec![InterruptRow::from_local(user_id, &interrupt)]
    }

    #[tokio::test]
    async fn repeated_upsert_keeps_one_row_per_natural_key() {
        let remote = InMemoryRemoteStore::new();
        let identity = Identity::new("user-1", "token");
        let rows = interrupt_rows("user-1");

        remote.upsert(&identity, &[], &rows).await.unwrap();
        remote.upsert(&identity, &[], &rows).await.unwrap();

        assert_eq!(remote.row_counts("user-1").interrupts, 1);
        assert_eq!(remote.upsert_calls(), 2);
    }

    #[tokio::test]
    async fn rows_are_scoped_to_identity() {
        let remote = InMemoryRemoteStore::new();
        remote
            .upsert(&Identity::new("user-1", "token"), &[], &interrupt_rows("user-1"))
            .await
            .unwrap();

        let snapshot = remote
            .fetch_all(&Identity::new("user-2", "token"))
            .await
            .unwrap();
        assert!(snapshot.interrupts.is_empty());
    }

    #[tokio::test]
    async fn raw_rows_get_surrogate_ids() {
        let remote = InMemoryRemoteStore::new();
        remote
            .insert_raw_interrupt(
                "user-1",
                json!({ "at": "2025-03-03T09:00:00Z", "outcome": "quit" }),
            )
            .unwrap();

        let snapshot = remote
            .fetch_all(&Identity::new("user-1", "token"))
            .await
            .unwrap();
        let (_, interrupts) = snapshot.normalize().unwrap();
        assert_eq!(interrupts[0].id, "1");
    }

    #[tokio::test]
    async fn injected_failure_is_remote_error() {
        let remote = InMemoryRemoteStore::new();
        remote.set_failure(Some("offline"));

        let error = remote
            .fetch_all(&Identity::new("user-1", "token"))
            .await
            .unwrap_err();
        assert!(error.is_remote());
        assert_eq!(remote.fetch_calls(), 1);
    }
}
