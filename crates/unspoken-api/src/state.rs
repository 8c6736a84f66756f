use std::sync::Arc;

use tracing::error;

use unspoken_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::providers::ChatProvider;
use crate::session::SessionSettings;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Active Echo backend. `None` when no credential is configured.
    pub chat: Option<Arc<dyn ChatProvider>>,
    pub sessions: SessionSettings,
}

impl AppStateInner {
    pub fn new(
        db: Database,
        chat: Option<Arc<dyn ChatProvider>>,
        sessions: SessionSettings,
    ) -> AppState {
        Arc::new(Self { db, chat, sessions })
    }
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal(e)
        })?
        .map_err(ApiError::from)
}
