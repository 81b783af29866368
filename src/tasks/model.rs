use std::str::FromStr;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "Invalid status `{other}`, expected one of pending, in-progress, completed"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

/// `description: Some(None)` clears the column, `None` leaves it alone.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

#[cfg(test)]
impl TaskChanges {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskOwner {
    pub name: String,
    pub email: String,
}

/// A task as seen in the admin listing, attributed to its owner.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskWithOwner {
    #[serde(flatten)]
    pub task: Task,
    pub user: TaskOwner,
}

#[derive(Debug, FromRow)]
pub(crate) struct TaskWithOwnerRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub owner_name: String,
    pub owner_email: String,
}

impl From<TaskWithOwnerRow> for TaskWithOwner {
    fn from(r: TaskWithOwnerRow) -> Self {
        Self {
            task: Task {
                id: r.id,
                title: r.title,
                description: r.description,
                status: r.status,
                user_id: r.user_id,
                created_at: r.created_at,
            },
            user: TaskOwner {
                name: r.owner_name,
                email: r.owner_email,
            },
        }
    }
}
