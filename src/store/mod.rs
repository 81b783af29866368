//! Persistence collaborator.
//!
//! Services only talk to [`Store`]; `PgStore` is the production backend and
//! the in-memory backend exists for tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::tasks::model::{NewTask, Task, TaskChanges, TaskWithOwner};
use crate::users::model::{NewUser, User, UserChanges};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Newest first.
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;
    /// Removes the user's tasks, then the user, as one unit. Returns whether
    /// the user existed.
    async fn delete_user_cascade(&self, id: Uuid) -> StoreResult<bool>;

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> StoreResult<Task>;
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;
    /// Newest first.
    async fn list_tasks_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> StoreResult<Vec<Task>>;
    /// Newest first, every user.
    async fn list_all_tasks(&self) -> StoreResult<Vec<TaskWithOwner>>;
    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}
