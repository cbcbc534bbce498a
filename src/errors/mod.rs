use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
};
use thiserror::Error;

use crate::monitoring::error_management::{ErrorCategory, ErrorSeverity, ManagedError};

/// Common trait for all custom error types in the application
pub trait AppError: std::error::Error + Send + Sync + 'static {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get the error code for frontend handling
    fn error_code(&self) -> &'static str;

    fn error_category(&self) -> ErrorCategory;

    fn error_severity(&self) -> ErrorSeverity;

    /// Get an optional suppression key for repeated error handling
    fn suppression_key(&self) -> Option<String> {
        None
    }

    fn suggested_action(&self) -> Option<String> {
        None
    }

    /// Convert to a ManagedError for the error management system
    fn to_managed_error(&self) -> ManagedError {
        ManagedError {
            category: self.error_category(),
            severity: self.error_severity(),
            code: self.error_code().to_string(),
            user_message: self.user_message(),
            technical_details: self.to_string(),
            suggested_action: self.suggested_action(),
            suppression_key: self.suppression_key(),
        }
    }
}

/// Macro to implement IntoResponse for all AppError types
///
/// `detail` repeats `error` for clients that read `{"detail": ...}`.
macro_rules! impl_into_response {
    ($error_type:ty) => {
        impl axum::response::IntoResponse for $error_type {
            fn into_response(self) -> axum::response::Response {
                use crate::errors::AppError;
                use crate::monitoring::error_management::get_error_manager;
                use axum::response::Json;
                use serde_json::json;

                let error_manager = get_error_manager();
                let managed_error = self.to_managed_error();
                tokio::spawn(async move {
                    error_manager.handle_error(managed_error).await;
                });

                let status = self.status_code();
                let message = self.user_message();
                let body = Json(json!({
                    "error": message,
                    "detail": message,
                    "code": self.error_code(),
                    "status": status.as_u16()
                }));

                (status, body).into_response()
            }
        }
    };
}

pub(crate) use impl_into_response;

/// Generic API error for cases where specific error types don't apply
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    #[error("Internal server error: {message}")]
    InternalServerError { message: String },
}

impl AppError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest { message } => message.clone(),
            ApiError::UnprocessableEntity { message } => message.clone(),
            ApiError::InternalServerError { .. } => "An internal error occurred".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::UnprocessableEntity { .. } => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    fn error_category(&self) -> ErrorCategory {
        match self {
            ApiError::InternalServerError { .. } => ErrorCategory::Database,
            _ => ErrorCategory::Validation,
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            ApiError::InternalServerError { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Expected,
        }
    }
}

impl_into_response!(ApiError);

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn unprocessable<S: Into<String>>(message: S) -> Self {
        Self::UnprocessableEntity { message: message.into() }
    }

    pub fn internal_server_error<S: Into<String>>(message: S) -> Self {
        Self::InternalServerError { message: message.into() }
    }
}

/// Well-formed JSON of the wrong shape is a 422; anything else about the body is a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(_) => Self::unprocessable(rejection.body_text()),
            _ => Self::bad_request(rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

// Submodules for concern-specific errors
pub mod analytics;
pub mod auth;
pub mod campaign;
pub mod website;
