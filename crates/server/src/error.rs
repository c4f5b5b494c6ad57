use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Failure of an outbound call to the identity provider.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network timeout after {0:?}")]
    Timeout(Duration),
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP status {status}: {context}")]
    Http { status: StatusCode, context: String },
    #[error("JSON parse error: {0}")]
    Json(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Failure of the login handshake. Always answered with a redirect back to
/// the login entry point; never creates a session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identity provider returned error `{error}`: {}", .description.as_deref().unwrap_or("no description"))]
    Provider {
        error: String,
        description: Option<String>,
    },
    #[error("No login is pending for this session")]
    NoPendingLogin,
    #[error("Pending login expired")]
    LoginExpired,
    #[error("State parameter does not match the pending login")]
    StateMismatch,
    #[error("Callback is missing the authorization code")]
    MissingCode,
    #[error("Callback query could not be parsed: {0}")]
    MalformedCallback(String),
    #[error("Provider discovery failed: {0}")]
    Discovery(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Token endpoint rejected the code: {0}")]
    TokenExchange(String),
    #[error("ID token rejected: {0}")]
    InvalidIdToken(String),
    #[error("ID token nonce does not match the pending login")]
    NonceMismatch,
    #[error("Random source unavailable: {0}")]
    Entropy(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidIdToken(e.to_string())
    }
}

/// Bad form input. Answered with a client error, no redirect, no state change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid subject")]
    UnknownSubject(Option<String>),
    #[error("No topic chosen")]
    EmptyTopic,
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// A session token that could not be used. Never surfaced to the visitor;
/// the session is treated as empty instead.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session payload is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Session expired")]
    Expired,
}

/// Errors produced by page handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(e) => e.into_response(),
            AppError::Template(e) => {
                tracing::error!("Failed to render template: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = ValidationError::UnknownSubject(Some("chemistry".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::from(ValidationError::EmptyTopic).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_error_display_includes_description() {
        let err = AuthError::Provider {
            error: "access_denied".into(),
            description: Some("user cancelled".into()),
        };
        assert_eq!(
            err.to_string(),
            "Identity provider returned error `access_denied`: user cancelled"
        );

        let err = AuthError::Provider {
            error: "access_denied".into(),
            description: None,
        };
        assert!(err.to_string().ends_with("no description"));
    }
}
