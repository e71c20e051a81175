//! HTTP error types for the iCoder server.
//!
//! Maps domain errors from `icoder-core` into HTTP responses. JSON errors
//! carry an `error` message and, for validation failures, the offending
//! `field`. Internal failures are logged here and answered with a generic
//! message.

use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use icoder_core::error::{AccountError, ContactError, ValidationError};

/// Plain-text body for a form that could not be persisted.
pub const NOT_SUBMITTED: &str = "Your form was not submitted.";

/// Body message for unexpected failures.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// A form field failed its schema.
    Validation(ValidationError),
    /// Client sent input that cannot be accepted.
    BadRequest(String),
    /// Authentication failed.
    Unauthorized(String),
    /// The form was valid but could not be persisted.
    NotSubmitted,
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, field) = match self {
            Self::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string(), Some(err.field())),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            Self::NotSubmitted => return (StatusCode::BAD_REQUEST, NOT_SUBMITTED).into_response(),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_MESSAGE.to_owned(),
                    None,
                )
            }
        };

        (status, axum::Json(ErrorBody { error, field })).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ContactError> for AppError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Invalid(inner) => Self::Validation(inner),
            ContactError::Serialization { .. } | ContactError::Storage(_) => {
                tracing::warn!(error = %err, "contact submission not persisted");
                Self::NotSubmitted
            }
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Invalid(inner) => Self::Validation(inner),
            AccountError::PasswordMismatch => Self::BadRequest(err.to_string()),
            AccountError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AccountError::AlreadyExists { .. } => {
                tracing::warn!(error = %err, "signup not persisted");
                Self::NotSubmitted
            }
            AccountError::Password(_)
            | AccountError::Serialization { .. }
            | AccountError::Storage(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session store error: {err}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn validation_names_the_field() {
        let (status, text) = body(ValidationError::Missing { field: "email" }.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["field"], "email");
        assert_eq!(json["error"], "email is required");
    }

    #[tokio::test]
    async fn mismatch_is_plain_json_error() {
        let (status, text) = body(AccountError::PasswordMismatch.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, r#"{"error":"Passwords do not match"}"#);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let (status, text) = body(AccountError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(text, r#"{"error":"Invalid credentials"}"#);
    }

    #[tokio::test]
    async fn duplicate_account_is_not_submitted() {
        let err = AccountError::AlreadyExists {
            email: "a@x.com".to_owned(),
        };
        let (status, text) = body(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, NOT_SUBMITTED);
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (status, text) = body(AppError::Internal("disk on fire".to_owned())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!text.contains("disk"));
        assert_eq!(text, r#"{"error":"Internal server error"}"#);
    }
}
