use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    guard::{authorize, Action, Identity, Resource},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
};
use crate::{
    error::AppError,
    store::Store,
    users::model::{NewUser, PublicUser},
};

pub const NAME_MAX_CHARS: usize = 100;
pub const PASSWORD_MIN_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Name must be at most {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

pub async fn register(store: &dyn Store, keys: &JwtKeys, input: RegisterRequest) -> Result<AuthResponse, AppError> {
    let name = validate_name(&input.name)?;
    let email = normalize_email(&input.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    if input.password.chars().count() < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::EmailTaken);
    }

    let password_hash = hash_password(&input.password)?;
    // the unique constraint still decides if two signups race
    let user = store
        .create_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;
    let token = keys.issue(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

pub async fn login(store: &dyn Store, keys: &JwtKeys, input: LoginRequest) -> Result<AuthResponse, AppError> {
    let email = normalize_email(&input.email);

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidLogin);
    };
    if !verify_password(&input.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidLogin);
    }

    let token = keys.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

pub async fn profile(store: &dyn Store, who: &Identity) -> Result<PublicUser, AppError> {
    authorize(Some(who), Action::Read, Resource::Profile).require("User")?;
    let user = store
        .find_user_by_id(who.id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::session::verify_session, state::AppState};

    fn signup(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice example.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn registered_token_resolves_to_same_identity() {
        let state = AppState::fake();
        let res = register(
            state.store.as_ref(),
            &state.keys,
            signup("Alice", "  Alice@Example.com ", "password123"),
        )
        .await
        .unwrap();
        assert_eq!(res.user.email, "alice@example.com");
        assert!(!res.user.is_admin);

        let who = verify_session(&state.keys, state.store.as_ref(), &res.token).await.unwrap();
        assert_eq!(who.id, res.user.id);
    }

    #[tokio::test]
    async fn register_validates_input() {
        let state = AppState::fake();
        let cases = [
            signup("", "a@example.com", "password123"),
            signup("A", "not-an-email", "password123"),
            signup("A", "a@example.com", "short"),
            // 7 characters, 13 bytes
            signup("A", "a@example.com", "пароль!"),
            signup(&"x".repeat(NAME_MAX_CHARS + 1), "a@example.com", "password123"),
        ];
        for case in cases {
            let err = register(state.store.as_ref(), &state.keys, case).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{err:?}");
        }
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let state = AppState::fake();
        register(state.store.as_ref(), &state.keys, signup("A", "a@example.com", "password123"))
            .await
            .unwrap();
        let err = register(state.store.as_ref(), &state.keys, signup("B", "A@example.com", "password456"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let state = AppState::fake();
        register(state.store.as_ref(), &state.keys, signup("A", "a@example.com", "password123"))
            .await
            .unwrap();

        let ok = login(
            state.store.as_ref(),
            &state.keys,
            LoginRequest {
                email: "A@example.com".into(),
                password: "password123".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(ok.user.email, "a@example.com");

        for (email, password) in [("a@example.com", "wrong-pass"), ("nobody@example.com", "password123")] {
            let err = login(
                state.store.as_ref(),
                &state.keys,
                LoginRequest {
                    email: email.into(),
                    password: password.into(),
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::InvalidLogin));
        }
    }

    #[tokio::test]
    async fn profile_returns_own_record() {
        let state = AppState::fake();
        let res = register(state.store.as_ref(), &state.keys, signup("Alice", "alice@example.com", "password123"))
            .await
            .unwrap();
        let who = verify_session(&state.keys, state.store.as_ref(), &res.token).await.unwrap();
        let me = profile(state.store.as_ref(), &who).await.unwrap();
        assert_eq!(me, res.user);
    }
}
