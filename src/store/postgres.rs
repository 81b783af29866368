use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::tasks::model::{NewTask, Task, TaskChanges, TaskWithOwner, TaskWithOwnerRow};
use crate::users::model::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, created_at";
const TASK_COLUMNS: &str = "id, title, description, status, user_id, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn user_write_error(e: sqlx::Error, what: &'static str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Backend(anyhow::Error::new(e).context(what)),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find user by id")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .context("find user by email")?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| user_write_error(e, "insert user"))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   is_admin = COALESCE($4, is_admin)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.is_admin)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| user_write_error(e, "update user"))
    }

    async fn delete_user_cascade(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.db.begin().await.context("begin tx")?;
        sqlx::query("DELETE FROM tasks WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete user tasks")?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete user")?
            .rows_affected();
        tx.commit().await.context("commit tx")?;
        Ok(deleted > 0)
    }

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> StoreResult<Task> {
        let row = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, status, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("insert task")?;
        Ok(row)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find task")?;
        Ok(row)
    }

    async fn list_tasks_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
              FROM tasks
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list tasks by user")?;
        Ok(rows)
    }

    async fn list_all_tasks(&self) -> StoreResult<Vec<TaskWithOwner>> {
        let rows = sqlx::query_as::<_, TaskWithOwnerRow>(
            r#"
            SELECT t.id, t.title, t.description, t.status, t.user_id, t.created_at,
                   u.name AS owner_name, u.email AS owner_email
              FROM tasks t
              JOIN users u ON u.id = t.user_id
             ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list all tasks")?;
        Ok(rows.into_iter().map(TaskWithOwner::from).collect())
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let (set_description, description) = match changes.description {
            Some(d) => (true, d),
            None => (false, None),
        };
        let row = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
               SET title = COALESCE($2, title),
                   description = CASE WHEN $3 THEN $4 ELSE description END,
                   status = COALESCE($5, status)
             WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(set_description)
        .bind(description)
        .bind(changes.status)
        .fetch_optional(&self.db)
        .await
        .context("update task")?;
        Ok(row)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete task")?
            .rows_affected();
        Ok(deleted > 0)
    }
}
