use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use super::{guard::Identity, jwt::JwtKeys};
use crate::{error::AppError, state::AppState, store::Store};

/// Resolves a bearer token to a live user.
///
/// Tokens cannot be revoked, so a token minted for a user who has since been
/// deleted still carries a valid signature; the lookup is what rejects it.
pub async fn verify_session(keys: &JwtKeys, store: &dyn Store, token: &str) -> Result<Identity, AppError> {
    let claims = keys.decode(token)?;
    let user = store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.sub, "token for unknown user");
            AppError::UnknownIdentity
        })?;
    let identity = Identity::from(&user);
    debug!(user_id = %identity.id, email = %identity.email, role = ?identity.role, "session verified");
    Ok(identity)
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extracts and verifies the session token, yielding the caller's identity.
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::MissingCredential)?;
        let identity = verify_session(&state.keys, state.store.as_ref(), token)
            .await
            .inspect_err(|e| warn!(error = %e, "session rejected"))?;
        Ok(CurrentUser(identity))
    }
}
