//! Application error types and result alias.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application result type alias
pub type Result<T> = std::result::Result<T, AppError>;

/// Whether internal error details are included in response bodies.
static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(false);

/// Include internal error details in responses (development only).
pub fn set_expose_details(enabled: bool) {
    EXPOSE_DETAILS.store(enabled, Ordering::Relaxed);
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Email/password did not match a stored account
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Access code for an elevated role was wrong or missing
    #[error("Invalid access code")]
    InvalidAccessCode,

    /// Missing or invalid bearer credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted for this resource
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Requested status is not in the caller's allow-list
    #[error("Role '{role}' may not set status '{status}'")]
    ForbiddenTransition { role: String, status: String },

    /// Note text was empty after trimming
    #[error("Note text cannot be empty")]
    InvalidNote,

    /// Not found error
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Email already registered
    #[error("An account with this email already exists")]
    DuplicateEmail,

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Too many attempts from one client
    #[error("Too many requests, retry in {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Address parse error
    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::InvalidAccessCode => (StatusCode::FORBIDDEN, "INVALID_ACCESS_CODE"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::ForbiddenTransition { .. } => {
                (StatusCode::FORBIDDEN, "FORBIDDEN_TRANSITION")
            }
            AppError::InvalidNote => (StatusCode::BAD_REQUEST, "INVALID_NOTE"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::DuplicateEmail => (StatusCode::CONFLICT, "DUPLICATE_EMAIL"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            AppError::Jwt(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Config(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Io(_)
            | AppError::AddrParse(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = if status.is_server_error() {
            tracing::error!(error = %self, code = code, "Request failed");
            if EXPOSE_DETAILS.load(Ordering::Relaxed) {
                json!({ "code": code, "message": "Server error", "detail": self.to_string() })
            } else {
                json!({ "code": code, "message": "Server error" })
            }
        } else {
            tracing::warn!(error = %self, code = code, "Request rejected");
            let message = match &self {
                AppError::Jwt(_) => "Invalid token".to_string(),
                other => other.to_string(),
            };
            json!({ "code": code, "message": message })
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_errors_map_to_client_statuses() {
        let cases = [
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AppError::InvalidAccessCode, StatusCode::FORBIDDEN),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                AppError::ForbiddenTransition {
                    role: "admin".into(),
                    status: "Review".into(),
                },
                StatusCode::FORBIDDEN,
            ),
            (AppError::InvalidNote, StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::DuplicateEmail, StatusCode::CONFLICT),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::RateLimited { retry_after: 5 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_and_code().0, expected, "wrong status for {err}");
        }
    }

    #[test]
    fn test_infrastructure_errors_are_internal() {
        let err = AppError::Internal("boom".into());
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
        let err = AppError::Config("missing".into());
        assert_eq!(err.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "42");
    }

    #[test]
    fn test_forbidden_transition_message_names_role_and_status() {
        let err = AppError::ForbiddenTransition {
            role: "agent".into(),
            status: "Closed".into(),
        };
        assert_eq!(err.to_string(), "Role 'agent' may not set status 'Closed'");
    }
}
