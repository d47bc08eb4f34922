//! Bounded session pool for the SQLite store
//!
//! Every statement checks out one pooled connection for its duration
//! and returns it on drop, on every exit path. A semaphore bounds the
//! number of sessions in flight; acquirers past the bound wait.

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::engine::{StoreError, StoreResult};

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: usize = 10;

struct PoolInner {
    connections: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
}

/// Fixed-size pool of SQLite connections.
pub struct SessionPool {
    inner: Arc<PoolInner>,
}

impl SessionPool {
    /// Build a pool over pre-opened connections.
    pub fn new(connections: Vec<Connection>) -> Self {
        let permits = Arc::new(Semaphore::new(connections.len()));
        Self {
            inner: Arc::new(PoolInner {
                connections: Mutex::new(connections),
                permits,
            }),
        }
    }

    /// Number of sessions not currently checked out.
    pub fn available(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Acquire a session, waiting until one is free.
    pub async fn acquire(&self) -> StoreResult<Session> {
        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let conn = self
            .inner
            .connections
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| StoreError::Unavailable("session pool exhausted".into()))?;
        Ok(Session {
            conn: Some(conn),
            inner: Arc::clone(&self.inner),
            _permit: permit,
        })
    }
}

/// One checked-out connection. Returned to the pool on drop.
pub struct Session {
    conn: Option<Connection>,
    inner: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl Session {
    pub fn connection(&self) -> &Connection {
        // Invariant: the connection is present until drop.
        self.conn.as_ref().expect("session already returned")
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.inner.connections.lock().unwrap().push(conn);
        }
    }
}
