//! Task repository trait
//!
//! Defines the interface for task storage operations.

use async_trait::async_trait;

use super::model::TaskItem;
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task; the store assigns its id and creation timestamp
    async fn create(&self, task: TaskItem) -> Result<TaskItem>;

    /// Get a task by id
    async fn get(&self, id: i64) -> Result<Option<TaskItem>>;

    /// Get all tasks
    async fn list(&self) -> Result<Vec<TaskItem>>;

    /// Replace the mutable fields of an existing task
    async fn update(&self, id: i64, task: TaskItem) -> Result<TaskItem>;

    /// Delete a task by id, returning whether it existed
    async fn delete(&self, id: i64) -> Result<bool>;
}
