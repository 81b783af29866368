use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, Pagination, UpdateTaskRequest},
    model::{NewTask, Task, TaskChanges, TaskStatus, TaskWithOwner, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS},
};
use crate::{
    auth::guard::{authorize, Action, Identity, Resource},
    error::AppError,
    store::Store,
};

const MAX_PAGE: i64 = 200;

fn validate_title(title: &str) -> Result<(), AppError> {
    let len = title.chars().count();
    if len == 0 {
        return Err(AppError::Validation("Title is required".into()));
    }
    if len > TITLE_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Title must be at most {TITLE_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    match description {
        Some(d) if d.chars().count() > DESCRIPTION_MAX_CHARS => Err(AppError::Validation(format!(
            "Description must be at most {DESCRIPTION_MAX_CHARS} characters"
        ))),
        _ => Ok(()),
    }
}

/// Empty or absent status means "not given".
fn parse_status(raw: Option<&str>) -> Result<Option<TaskStatus>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse::<TaskStatus>().map(Some).map_err(AppError::Validation),
        None => Ok(None),
    }
}

/// Loads a task and checks `action` against its owner. Absent and foreign
/// tasks produce the same error.
async fn load_for(store: &dyn Store, who: &Identity, action: Action, id: Uuid) -> Result<Task, AppError> {
    let task = store.find_task(id).await?.ok_or(AppError::NotFound("Task"))?;
    authorize(Some(who), action, Resource::Task { owner: task.user_id }).require("Task")?;
    Ok(task)
}

pub async fn list_own(store: &dyn Store, who: &Identity, page: Pagination) -> Result<Vec<Task>, AppError> {
    authorize(Some(who), Action::Read, Resource::OwnTasks).require("Task")?;
    let limit = page.limit.clamp(1, MAX_PAGE);
    let offset = page.offset.max(0);
    Ok(store.list_tasks_for_user(who.id, limit, offset).await?)
}

pub async fn create(store: &dyn Store, who: &Identity, input: CreateTaskRequest) -> Result<Task, AppError> {
    authorize(Some(who), Action::Create, Resource::OwnTasks).require("Task")?;
    validate_title(&input.title)?;
    validate_description(input.description.as_deref())?;
    let status = parse_status(input.status.as_deref())?.unwrap_or_default();

    let task = store
        .create_task(
            who.id,
            NewTask {
                title: input.title,
                description: input.description,
                status,
            },
        )
        .await?;
    info!(user_id = %who.id, task_id = %task.id, "task created");
    Ok(task)
}

pub async fn get(store: &dyn Store, who: &Identity, id: Uuid) -> Result<Task, AppError> {
    load_for(store, who, Action::Read, id).await
}

pub async fn update(store: &dyn Store, who: &Identity, id: Uuid, input: UpdateTaskRequest) -> Result<Task, AppError> {
    load_for(store, who, Action::Update, id).await?;

    let title = input.title.filter(|t| !t.is_empty());
    if let Some(t) = &title {
        validate_title(t)?;
    }
    if let Some(d) = &input.description {
        validate_description(d.as_deref())?;
    }
    let changes = TaskChanges {
        title,
        description: input.description,
        status: parse_status(input.status.as_deref())?,
    };

    // deleted concurrently between the load and the write
    let task = store
        .update_task(id, changes)
        .await?
        .ok_or(AppError::NotFound("Task"))?;
    info!(user_id = %who.id, task_id = %id, "task updated");
    Ok(task)
}

pub async fn delete(store: &dyn Store, who: &Identity, id: Uuid) -> Result<(), AppError> {
    load_for(store, who, Action::Delete, id).await?;
    if !store.delete_task(id).await? {
        return Err(AppError::NotFound("Task"));
    }
    info!(user_id = %who.id, task_id = %id, "task deleted");
    Ok(())
}

pub async fn list_all(store: &dyn Store, who: &Identity) -> Result<Vec<TaskWithOwner>, AppError> {
    authorize(Some(who), Action::AdminList, Resource::AllTasks).require("Task")?;
    Ok(store.list_all_tasks().await?)
}

pub async fn admin_delete(store: &dyn Store, who: &Identity, id: Uuid) -> Result<(), AppError> {
    // before the lookup, so non-admins cannot probe ids
    authorize(Some(who), Action::AdminDelete, Resource::AllTasks).require("Task")?;
    load_for(store, who, Action::AdminDelete, id).await?;
    if !store.delete_task(id).await? {
        return Err(AppError::NotFound("Task"));
    }
    info!(admin_id = %who.id, task_id = %id, "task deleted by admin");
    Ok(())
}
