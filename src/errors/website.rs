use axum::http::StatusCode;
use thiserror::Error;

use super::AppError;
use crate::monitoring::error_management::{ErrorCategory, ErrorSeverity};

/// Errors from website integration, analysis and platform suggestions
#[derive(Error, Debug)]
pub enum WebsiteError {
    #[error("Invalid website URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Website analysis failed: {details}")]
    AnalysisFailed { details: String },

    #[error("Platform suggestions failed: {details}")]
    SuggestionsFailed { details: String },
}

impl AppError for WebsiteError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebsiteError::InvalidUrl { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            WebsiteError::InvalidUrl { reason, .. } => format!("Invalid website URL: {}", reason),
            WebsiteError::AnalysisFailed { .. } => "Website analysis failed".to_string(),
            WebsiteError::SuggestionsFailed { .. } => "Platform suggestions failed".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            WebsiteError::InvalidUrl { .. } => "WEBSITE_INVALID_URL",
            WebsiteError::AnalysisFailed { .. } => "WEBSITE_ANALYSIS_FAILED",
            WebsiteError::SuggestionsFailed { .. } => "WEBSITE_SUGGESTIONS_FAILED",
        }
    }

    fn error_category(&self) -> ErrorCategory {
        match self {
            WebsiteError::InvalidUrl { .. } => ErrorCategory::Validation,
            _ => ErrorCategory::AiService,
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            WebsiteError::InvalidUrl { .. } => ErrorSeverity::Expected,
            _ => ErrorSeverity::Important,
        }
    }
}

impl_into_response!(WebsiteError);

impl WebsiteError {
    pub fn invalid_url<S: Into<String>>(url: S, reason: S) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
