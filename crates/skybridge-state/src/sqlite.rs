//! SQLite implementation of the StateStore trait.
//!
//! This is the primary backend: the host survives process restarts between
//! wake-ups, so endpoint state lives in a small local database. Uses
//! rusqlite with bundled SQLite behind a mutex.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use skybridge_core::EndpointName;

use crate::error::{Result, StateError};
use crate::migration;
use crate::state::EndpointState;
use crate::traits::StateStore;

/// SQLite-based state store implementation.
pub struct SqliteStateStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStateStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| {
            StateError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                Some(format!("mutex poisoned: {}", e)),
            ))
        })?;
        f(&conn)
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load(&self, endpoint: &EndpointName) -> Result<Option<EndpointState>> {
        self.with_conn(|conn| {
            let blob: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT state FROM endpoint_state WHERE endpoint = ?1",
                    params![endpoint.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            match blob {
                Some(bytes) => {
                    let state = EndpointState::from_bytes(&bytes)
                        .map_err(|e| StateError::Serialization(e.to_string()))?;
                    Ok(Some(state))
                }
                None => Ok(None),
            }
        })
    }

    async fn save(&self, endpoint: &EndpointName, state: &EndpointState) -> Result<()> {
        let bytes = state.to_bytes();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO endpoint_state (endpoint, state, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(endpoint) DO UPDATE SET
                     state = excluded.state,
                     updated_at = excluded.updated_at",
                params![endpoint.as_str(), bytes, now_millis()],
            )?;
            Ok(())
        })
    }

    async fn clear(&self, endpoint: &EndpointName) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM endpoint_state WHERE endpoint = ?1",
                params![endpoint.as_str()],
            )?;
            Ok(())
        })
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybridge_core::{Capability, RequestRecord};

    fn endpoint() -> EndpointName {
        EndpointName::new("cloud").unwrap()
    }

    fn sample_state() -> EndpointState {
        let mut state = EndpointState::default();
        state.record_publish(RequestRecord {
            want_credentials: true,
            capabilities: [Capability::SecurityManagement].into_iter().collect(),
            label: None,
        });
        state.joined = true;
        state
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let store = SqliteStateStore::open_memory().unwrap();
        assert!(store.load(&endpoint()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = SqliteStateStore::open_memory().unwrap();
        let state = sample_state();
        store.save(&endpoint(), &state).await.unwrap();
        assert_eq!(store.load(&endpoint()).await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = SqliteStateStore::open_memory().unwrap();
        store.save(&endpoint(), &sample_state()).await.unwrap();

        let mut newer = sample_state();
        newer.ready = true;
        store.save(&endpoint(), &newer).await.unwrap();

        assert_eq!(store.load(&endpoint()).await.unwrap(), Some(newer));
    }

    #[tokio::test]
    async fn test_clear_removes_state() {
        let store = SqliteStateStore::open_memory().unwrap();
        store.save(&endpoint(), &sample_state()).await.unwrap();
        store.clear(&endpoint()).await.unwrap();
        assert!(store.load(&endpoint()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        let state = sample_state();
        {
            let store = SqliteStateStore::open(&path).unwrap();
            store.save(&endpoint(), &state).await.unwrap();
        }

        let store = SqliteStateStore::open(&path).unwrap();
        assert_eq!(store.load(&endpoint()).await.unwrap(), Some(state));
    }
}
