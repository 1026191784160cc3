//! SQLite-backed task storage implementation
//!
//! Tasks live in a single `tasks` table. Timestamps are stored as RFC 3339
//! text, the priority and status enums as their integer codes. Field
//! constraints are enforced both by [`TaskItem::validate`] and by CHECK
//! constraints in the schema.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};

use super::model::{TaskItem, TaskPriority, TaskStatus};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// SQLite-backed task store
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

/// Raw row shape of the `tasks` table
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: Option<String>,
    is_completed: bool,
    created_at: String,
    completed_at: Option<String>,
    due_date: Option<String>,
    priority: i64,
    status: i64,
    assigned_user_id: Option<i64>,
}

fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("invalid {field} timestamp {value:?}: {e}")))
}

impl TryFrom<TaskRow> for TaskItem {
    type Error = Error;

    fn try_from(row: TaskRow) -> Result<Self> {
        let priority = TaskPriority::try_from(row.priority)
            .map_err(|_| Error::Storage(format!("invalid priority code in row: {}", row.priority)))?;
        let status = TaskStatus::try_from(row.status)
            .map_err(|_| Error::Storage(format!("invalid status code in row: {}", row.status)))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            is_completed: row.is_completed,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            completed_at: row
                .completed_at
                .as_deref()
                .map(|v| parse_timestamp("completed_at", v))
                .transpose()?,
            due_date: row
                .due_date
                .as_deref()
                .map(|v| parse_timestamp("due_date", v))
                .transpose()?,
            priority,
            status,
            assigned_user_id: row.assigned_user_id,
        })
    }
}

impl SqliteTaskStore {
    /// Open (or create) the task database at the given path and run
    /// the embedded migrations.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", path.display()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        sqlx::migrate!("src/task/migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Insert a handful of demonstration tasks when the table is empty.
    ///
    /// Called once at server startup; a restart against an existing
    /// database is a no-op.
    pub async fn seed_demo_tasks(&self) -> Result<()> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        let demos = [
            TaskItem::new("Set up the project board")
                .with_description("Collect the initial backlog and triage it into columns")
                .with_status(TaskStatus::InProgress),
            TaskItem::new("Write the deployment runbook")
                .with_priority(TaskPriority::High)
                .with_due_date(Utc::now() + chrono::Duration::days(7)),
            TaskItem::new("Review onboarding docs").with_assigned_user(1),
        ];
        for task in demos {
            self.create(task).await?;
        }

        tracing::info!("Seeded demonstration tasks");
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskStore {
    async fn create(&self, mut task: TaskItem) -> Result<TaskItem> {
        task.reconcile_completion(None);
        task.validate()?;
        task.created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO tasks (title, description, is_completed, created_at, completed_at, \
             due_date, priority, status, assigned_user_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.is_completed)
        .bind(task.created_at.to_rfc3339())
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .bind(task.due_date.map(|t| t.to_rfc3339()))
        .bind(i64::from(task.priority))
        .bind(i64::from(task.status))
        .bind(task.assigned_user_id)
        .execute(&self.pool)
        .await?;

        task.id = result.last_insert_rowid();
        Ok(task)
    }

    async fn get(&self, id: i64) -> Result<Option<TaskItem>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaskItem::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<TaskItem>> {
        let rows: Vec<TaskRow> = sqlx::query_as("SELECT * FROM tasks ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TaskItem::try_from).collect()
    }

    async fn update(&self, id: i64, mut task: TaskItem) -> Result<TaskItem> {
        let previous = self.get(id).await?.ok_or(Error::TaskNotFound(id))?;

        // id and created_at are immutable; completion state follows status.
        task.id = previous.id;
        task.created_at = previous.created_at;
        task.reconcile_completion(Some(&previous));
        task.validate()?;

        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, is_completed = ?, completed_at = ?, \
             due_date = ?, priority = ?, status = ?, assigned_user_id = ? WHERE id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.is_completed)
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .bind(task.due_date.map(|t| t.to_rfc3339()))
        .bind(i64::from(task.priority))
        .bind(i64::from(task.status))
        .bind(task.assigned_user_id)
        .bind(task.id)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
