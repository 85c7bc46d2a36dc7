//! Shared handler state.

use crate::error::ApiError;
use meteorite_core::{MeteoriteService, RepoResult, SqliteMeteoriteRepository};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// SQLite connection shared by every handler.
///
/// Queries are serialized on the one connection; each runs on the blocking
/// thread pool so async workers never wait on SQLite.
#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `query` against a service bound to the shared connection.
    pub async fn with_service<T, F>(&self, query: F) -> Result<T, ApiError>
    where
        F: FnOnce(&MeteoriteService<SqliteMeteoriteRepository<'_>>) -> RepoResult<T>
            + Send
            + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| ApiError::Internal("database connection lock poisoned".to_string()))?;
            let service = MeteoriteService::new(SqliteMeteoriteRepository::new(&guard));
            query(&service).map_err(ApiError::from)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("query task failed: {err}")))?
    }
}
