use axum::http::StatusCode;
use thiserror::Error;

use super::AppError;
use crate::monitoring::error_management::{ErrorCategory, ErrorSeverity};

/// Errors raised while authenticating a request
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingToken,

    #[error("Invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("Token has expired")]
    TokenExpired,

    #[error("Signing keys unavailable: {message}")]
    SigningKeysUnavailable { message: String },

    #[error("User profile store failed: {message}")]
    ProfileStore { message: String },
}

impl AppError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ProfileStore { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn user_message(&self) -> String {
        match self {
            AuthError::MissingToken => "Not authenticated".to_string(),
            AuthError::ProfileStore { .. } => "Failed to load user profile".to_string(),
            _ => "Invalid authentication token".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "AUTH_MISSING_TOKEN",
            AuthError::InvalidToken { .. } => "AUTH_INVALID_TOKEN",
            AuthError::TokenExpired => "AUTH_TOKEN_EXPIRED",
            AuthError::SigningKeysUnavailable { .. } => "AUTH_SIGNING_KEYS_UNAVAILABLE",
            AuthError::ProfileStore { .. } => "AUTH_PROFILE_STORE_FAILED",
        }
    }

    fn error_category(&self) -> ErrorCategory {
        match self {
            AuthError::ProfileStore { .. } => ErrorCategory::Database,
            _ => ErrorCategory::Auth,
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            AuthError::MissingToken | AuthError::TokenExpired => ErrorSeverity::Expected,
            AuthError::InvalidToken { .. } => ErrorSeverity::Minor,
            AuthError::SigningKeysUnavailable { .. } => ErrorSeverity::Important,
            AuthError::ProfileStore { .. } => ErrorSeverity::Critical,
        }
    }

    fn suppression_key(&self) -> Option<String> {
        match self {
            AuthError::SigningKeysUnavailable { .. } => Some("auth_signing_keys_unavailable".to_string()),
            AuthError::InvalidToken { .. } => Some("auth_invalid_token".to_string()),
            _ => None,
        }
    }

    fn suggested_action(&self) -> Option<String> {
        match self {
            AuthError::MissingToken | AuthError::TokenExpired => Some("Please sign in again".to_string()),
            _ => None,
        }
    }
}

impl_into_response!(AuthError);

impl AuthError {
    pub fn invalid_token<S: Into<String>>(reason: S) -> Self {
        Self::InvalidToken { reason: reason.into() }
    }

    pub fn profile_store<S: Into<String>>(message: S) -> Self {
        Self::ProfileStore { message: message.into() }
    }
}
