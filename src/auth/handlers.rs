use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    services,
    session::CurrentUser,
};
use crate::{error::AppError, extract::ApiJson, state::AppState, users::model::PublicUser};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let res = services::register(state.store.as_ref(), &state.keys, payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let res = services::login(state.store.as_ref(), &state.keys, payload).await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(who): CurrentUser,
) -> Result<Json<PublicUser>, AppError> {
    Ok(Json(services::profile(state.store.as_ref(), &who).await?))
}
