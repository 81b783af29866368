use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, Pagination, UpdateTaskRequest},
    model::{Task, TaskWithOwner},
    services,
};
use crate::{
    auth::session::CurrentUser,
    error::AppError,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).put(update_task).delete(delete_task))
}

pub fn admin_task_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/tasks", get(list_all_tasks))
        .route("/admin/tasks/:id", axum::routing::delete(admin_delete_task))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiQuery(page): ApiQuery<Pagination>,
) -> Result<Json<Vec<Task>>, AppError> {
    Ok(Json(services::list_own(state.store.as_ref(), &who, page).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = services::create(state.store.as_ref(), &who, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(services::get(state.store.as_ref(), &who, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(services::update(state.store.as_ref(), &who, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    services::delete(state.store.as_ref(), &who, id).await?;
    Ok(Json(json!({ "message": "Task removed" })))
}

#[instrument(skip(state))]
pub async fn list_all_tasks(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
) -> Result<Json<Vec<TaskWithOwner>>, AppError> {
    Ok(Json(services::list_all(state.store.as_ref(), &who).await?))
}

#[instrument(skip(state))]
pub async fn admin_delete_task(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    services::admin_delete(state.store.as_ref(), &who, id).await?;
    Ok(Json(json!({ "message": "Task removed" })))
}
