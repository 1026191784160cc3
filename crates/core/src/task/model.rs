//! Task model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum title length, in characters.
pub const TITLE_MAX_LEN: usize = 200;

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Task priority level
///
/// Encoded as its integer code both in the database and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl From<TaskPriority> for i64 {
    fn from(priority: TaskPriority) -> i64 {
        match priority {
            TaskPriority::Low => 1,
            TaskPriority::Medium => 2,
            TaskPriority::High => 3,
            TaskPriority::Critical => 4,
        }
    }
}

impl TryFrom<i64> for TaskPriority {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            4 => Ok(Self::Critical),
            other => Err(Error::Validation(format!(
                "invalid priority code: {other}"
            ))),
        }
    }
}

/// Task workflow status
///
/// Encoded as its integer code both in the database and on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl From<TaskStatus> for i64 {
    fn from(status: TaskStatus) -> i64 {
        match status {
            TaskStatus::NotStarted => 1,
            TaskStatus::InProgress => 2,
            TaskStatus::OnHold => 3,
            TaskStatus::Completed => 4,
            TaskStatus::Cancelled => 5,
        }
    }
}

impl TryFrom<i64> for TaskStatus {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Self::NotStarted),
            2 => Ok(Self::InProgress),
            3 => Ok(Self::OnHold),
            4 => Ok(Self::Completed),
            5 => Ok(Self::Cancelled),
            other => Err(Error::Validation(format!("invalid status code: {other}"))),
        }
    }
}

/// A task item tracked by the service
///
/// `id` and `created_at` are assigned by the store on insert; `is_completed`
/// and `completed_at` are derived from `status` (see
/// [`TaskItem::reconcile_completion`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub assigned_user_id: Option<i64>,
}

impl TaskItem {
    /// Create a new task with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: None,
            is_completed: false,
            created_at: Utc::now(),
            completed_at: None,
            due_date: None,
            priority: TaskPriority::default(),
            status: TaskStatus::default(),
            assigned_user_id: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Assign the task to a user
    pub fn with_assigned_user(mut self, user_id: i64) -> Self {
        self.assigned_user_id = Some(user_id);
        self
    }

    /// Check the field constraints every stored task must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("title must not be empty".to_string()));
        }
        if self.title.chars().count() > TITLE_MAX_LEN {
            return Err(Error::Validation(format!(
                "title must not exceed {TITLE_MAX_LEN} characters"
            )));
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_LEN {
                return Err(Error::Validation(format!(
                    "description must not exceed {DESCRIPTION_MAX_LEN} characters"
                )));
            }
        }
        Ok(())
    }

    /// Bring `is_completed` and `completed_at` in line with `status`.
    ///
    /// `completed_at` is stamped when the task first enters
    /// [`TaskStatus::Completed`], preserved while it stays there, and
    /// cleared when it leaves. `previous` is the stored record being
    /// replaced, if any. Client-supplied values for the two derived fields
    /// are overwritten here.
    pub fn reconcile_completion(&mut self, previous: Option<&TaskItem>) {
        if self.status == TaskStatus::Completed {
            self.is_completed = true;
            self.completed_at = previous
                .filter(|prev| prev.status == TaskStatus::Completed)
                .and_then(|prev| prev.completed_at)
                .or_else(|| Some(Utc::now()));
        } else {
            self.is_completed = false;
            self.completed_at = None;
        }
    }
}
