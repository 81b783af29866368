use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::UpdateUserRequest,
    model::{PublicUser, UserChanges},
};
use crate::{
    auth::{
        guard::{authorize, Action, Identity, Resource},
        services::{is_valid_email, normalize_email, validate_name},
    },
    error::AppError,
    store::Store,
};

pub async fn list_users(store: &dyn Store, who: &Identity) -> Result<Vec<PublicUser>, AppError> {
    authorize(Some(who), Action::AdminList, Resource::Users).require("User")?;
    let users = store.list_users().await?;
    Ok(users.into_iter().map(PublicUser::from).collect())
}

/// The only path that can change `is_admin`.
pub async fn update_user(
    store: &dyn Store,
    who: &Identity,
    id: Uuid,
    input: UpdateUserRequest,
) -> Result<PublicUser, AppError> {
    authorize(Some(who), Action::AdminUpdate, Resource::User { id }).require("User")?;

    let name = match input.name.filter(|n| !n.is_empty()) {
        Some(n) => Some(validate_name(&n)?),
        None => None,
    };
    let email = match input.email.filter(|e| !e.is_empty()) {
        Some(e) => {
            let e = normalize_email(&e);
            if !is_valid_email(&e) {
                return Err(AppError::Validation("Invalid email".into()));
            }
            Some(e)
        }
        None => None,
    };
    let changes = UserChanges {
        name,
        email,
        is_admin: input.is_admin,
    };

    let user = store
        .update_user(id, changes)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    if let Some(flag) = input.is_admin {
        info!(admin_id = %who.id, user_id = %id, is_admin = flag, "user role set");
    }
    info!(admin_id = %who.id, user_id = %id, "user updated");
    Ok(user.into())
}

/// Deletes a user and, first, every task they own.
pub async fn delete_user(store: &dyn Store, who: &Identity, id: Uuid) -> Result<(), AppError> {
    authorize(Some(who), Action::AdminDelete, Resource::User { id }).require("User")?;
    if !store.delete_user_cascade(id).await? {
        return Err(AppError::NotFound("User"));
    }
    info!(admin_id = %who.id, user_id = %id, "user and tasks removed");
    Ok(())
}

/// Promotes the configured bootstrap account at startup. Not reachable over HTTP.
pub async fn promote_bootstrap_admin(store: &dyn Store, email: &str) -> anyhow::Result<bool> {
    let Some(user) = store.find_user_by_email(email).await? else {
        warn!(email = %email, "bootstrap admin not registered yet");
        return Ok(false);
    };
    if user.is_admin {
        return Ok(false);
    }
    store
        .update_user(
            user.id,
            UserChanges {
                is_admin: Some(true),
                ..Default::default()
            },
        )
        .await?;
    info!(user_id = %user.id, email = %email, "bootstrap admin promoted");
    Ok(true)
}
