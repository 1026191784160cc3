//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use tm_core::task::SqliteTaskStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: SqliteTaskStore,
}

impl AppState {
    /// Create a new AppState with the given data directory, seeding
    /// demonstration data into an empty store
    pub async fn new(data_dir: PathBuf) -> tm_core::Result<Self> {
        let task_store = SqliteTaskStore::new(data_dir.join("tasks.db")).await?;
        task_store.seed_demo_tasks().await?;
        Ok(Self::with_store(task_store))
    }

    /// Build state around an existing store, without seeding
    pub fn with_store(task_store: SqliteTaskStore) -> Self {
        Self {
            inner: Arc::new(AppStateInner { task_store }),
        }
    }

    /// Get reference to the task store
    pub fn task_store(&self) -> &SqliteTaskStore {
        &self.inner.task_store
    }
}
