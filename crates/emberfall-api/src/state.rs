use std::sync::Arc;

use emberfall_db::{Database, DbError};

use crate::error::ApiError;
use crate::token::TokenKeys;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub tokens: TokenKeys,
    /// Development mode: 500 responses carry the raw error text.
    pub expose_errors: bool,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, tokens: TokenKeys, expose_errors: bool) -> AppState {
        Arc::new(Self {
            db,
            tokens,
            expose_errors,
        })
    }

    /// Run blocking DB work off the async runtime. Duplicate keys surface as
    /// `Conflict(conflict_message)`; any other storage failure is a 500.
    pub async fn db_call<F, T>(&self, conflict_message: &'static str, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| ApiError::internal(format!("spawn_blocking join error: {e}"), self.expose_errors))?
            .map_err(|e| ApiError::from_db(e, conflict_message, self.expose_errors))
    }

    /// [`Self::db_call`] for calls that cannot hit a unique constraint.
    pub async fn db_exec<F, T>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        self.db_call("Resource already exists", f).await
    }
}
