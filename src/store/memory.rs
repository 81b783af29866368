use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::tasks::model::{NewTask, Task, TaskChanges, TaskOwner, TaskWithOwner};
use crate::users::model::{NewUser, User, UserChanges};

/// Vec-backed store; rows are kept in insertion order so "newest first" is a reverse walk.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tasks: Vec<Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn task_count_for(&self, user_id: Uuid) -> usize {
        self.inner.read().await.tasks.iter().filter(|t| t.user_id == user_id).count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.inner.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let row = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: false,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.read().await.users.iter().rev().cloned().collect())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut t = self.inner.write().await;
        if let Some(email) = &changes.email {
            if t.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(is_admin) = changes.is_admin {
            user.is_admin = is_admin;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user_cascade(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        t.tasks.retain(|task| task.user_id != id);
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        Ok(t.users.len() < before)
    }

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> StoreResult<Task> {
        let row = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            status: task.status,
            user_id,
            created_at: OffsetDateTime::now_utc(),
        };
        self.inner.write().await.tasks.push(row.clone());
        Ok(row)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().await.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> StoreResult<Vec<Task>> {
        Ok(self
            .inner
            .read()
            .await
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_all_tasks(&self) -> StoreResult<Vec<TaskWithOwner>> {
        let t = self.inner.read().await;
        let rows: Vec<TaskWithOwner> = t
            .tasks
            .iter()
            .rev()
            .filter_map(|task| {
                let owner = t.users.iter().find(|u| u.id == task.user_id)?;
                Some(TaskWithOwner {
                    task: task.clone(),
                    user: TaskOwner {
                        name: owner.name.clone(),
                        email: owner.email.clone(),
                    },
                })
            })
            .collect();
        Ok(rows)
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut t = self.inner.write().await;
        let Some(task) = t.tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(None);
        };
        changes.apply(task);
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.inner.write().await;
        let before = t.tasks.len();
        t.tasks.retain(|task| task.id != id);
        Ok(t.tasks.len() < before)
    }
}
