use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use super::{dto::UpdateUserRequest, model::PublicUser, services};
use crate::{
    auth::session::CurrentUser,
    error::AppError,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", put(update_user).delete(delete_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    Ok(Json(services::list_users(state.store.as_ref(), &who).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<PublicUser>, AppError> {
    Ok(Json(services::update_user(state.store.as_ref(), &who, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    services::delete_user(state.store.as_ref(), &who, id).await?;
    Ok(Json(json!({ "message": "User and all associated tasks removed" })))
}
