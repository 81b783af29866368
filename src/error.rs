use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// Every failure a request can end in, mapped onto a status code in `into_response`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("User already exists")]
    EmailTaken,

    #[error("Not authorized, no token")]
    MissingCredential,

    #[error("Not authorized, token failed")]
    InvalidCredential,

    #[error("Not authorized, token expired")]
    ExpiredCredential,

    #[error("Not authorized, user no longer exists")]
    UnknownIdentity,

    #[error("Invalid credentials")]
    InvalidLogin,

    /// Either absent or owned by someone else; callers cannot tell which.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not authorized as an admin")]
    Forbidden,

    #[error("Cannot delete your own admin account")]
    SelfDeleteForbidden,

    #[error("persistence failure: {0}")]
    Persistence(anyhow::Error),

    /// Anything else unexpected, e.g. hashing or token signing.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::EmailTaken | AppError::SelfDeleteForbidden => {
                StatusCode::BAD_REQUEST
            }
            AppError::MissingCredential
            | AppError::InvalidCredential
            | AppError::ExpiredCredential
            | AppError::UnknownIdentity
            | AppError::InvalidLogin => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => AppError::EmailTaken,
            StoreError::Backend(e) => AppError::Persistence(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Persistence(e) => {
                error!(error = %e, "persistence failure");
                "Server Error".to_string()
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                "Server Error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmailTaken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ExpiredCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::UnknownIdentity.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound("Task").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::SelfDeleteForbidden.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Persistence(anyhow::anyhow!("db down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("argon2")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_store_failures_are_internal() {
        fn hash() -> anyhow::Result<String> {
            anyhow::bail!("argon2 out of memory")
        }
        fn register() -> Result<String, AppError> {
            Ok(hash()?)
        }
        assert!(matches!(register(), Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn persistence_detail_is_not_leaked() {
        let res = AppError::Persistence(anyhow::anyhow!("connection refused to 10.0.0.5")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Server Error"));
        assert!(!text.contains("10.0.0.5"));

        let res = AppError::Internal(anyhow::anyhow!("salt generation failed")).into_response();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Server Error"));
        assert!(!text.contains("salt"));
    }

    #[test]
    fn store_errors_convert() {
        assert!(matches!(AppError::from(StoreError::DuplicateEmail), AppError::EmailTaken));
        assert!(matches!(
            AppError::from(StoreError::Backend(anyhow::anyhow!("x"))),
            AppError::Persistence(_)
        ));
    }
}
