use axum::http::StatusCode;
use thiserror::Error;

use super::AppError;
use crate::monitoring::error_management::{ErrorCategory, ErrorSeverity};

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Analytics retrieval failed: {details}")]
    RetrievalFailed { details: String },

    #[error("Audit log retrieval failed: {details}")]
    AuditLogFailed { details: String },
}

impl AppError for AnalyticsError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn user_message(&self) -> String {
        match self {
            AnalyticsError::RetrievalFailed { .. } => "Analytics retrieval failed".to_string(),
            AnalyticsError::AuditLogFailed { .. } => "Audit log retrieval failed".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AnalyticsError::RetrievalFailed { .. } => "ANALYTICS_RETRIEVAL_FAILED",
            AnalyticsError::AuditLogFailed { .. } => "ANALYTICS_AUDIT_LOG_FAILED",
        }
    }

    fn error_category(&self) -> ErrorCategory {
        match self {
            AnalyticsError::RetrievalFailed { .. } => ErrorCategory::AdsPlatform,
            AnalyticsError::AuditLogFailed { .. } => ErrorCategory::Database,
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        ErrorSeverity::Important
    }

    fn suppression_key(&self) -> Option<String> {
        match self {
            AnalyticsError::RetrievalFailed { .. } => Some("analytics_retrieval_failed".to_string()),
            AnalyticsError::AuditLogFailed { .. } => None,
        }
    }
}

impl_into_response!(AnalyticsError);
