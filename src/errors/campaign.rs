use axum::http::StatusCode;
use thiserror::Error;

use super::AppError;
use crate::monitoring::error_management::{ErrorCategory, ErrorSeverity};

/// Errors related to campaign generation, drafts and publishing
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Budget must be greater than zero, got {budget}")]
    InvalidBudget { budget: f64 },

    #[error("AI service unavailable: {details}")]
    AiUnavailable { details: String },

    #[error("Failed to parse AI response: {details}")]
    MalformedAiResponse { details: String },

    #[error("Campaign draft {id} not found")]
    DraftNotFound { id: String },

    #[error("Campaign generation failed: {details}")]
    GenerationFailed { details: String },

    #[error("Campaign publishing failed: {details}")]
    PublishFailed { details: String },
}

impl AppError for CampaignError {
    fn status_code(&self) -> StatusCode {
        match self {
            CampaignError::InvalidBudget { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CampaignError::AiUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CampaignError::DraftNotFound { .. } => StatusCode::NOT_FOUND,
            CampaignError::MalformedAiResponse { .. }
            | CampaignError::GenerationFailed { .. }
            | CampaignError::PublishFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn user_message(&self) -> String {
        match self {
            CampaignError::InvalidBudget { .. } => "Campaign budget must be greater than zero".to_string(),
            CampaignError::AiUnavailable { .. } => "AI service temporarily unavailable".to_string(),
            CampaignError::MalformedAiResponse { .. } => "Failed to parse AI response".to_string(),
            CampaignError::DraftNotFound { .. } => "Campaign draft not found".to_string(),
            CampaignError::GenerationFailed { .. } => "Campaign generation failed".to_string(),
            CampaignError::PublishFailed { .. } => "Campaign publishing failed".to_string(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            CampaignError::InvalidBudget { .. } => "CAMPAIGN_INVALID_BUDGET",
            CampaignError::AiUnavailable { .. } => "CAMPAIGN_AI_UNAVAILABLE",
            CampaignError::MalformedAiResponse { .. } => "CAMPAIGN_MALFORMED_AI_RESPONSE",
            CampaignError::DraftNotFound { .. } => "CAMPAIGN_DRAFT_NOT_FOUND",
            CampaignError::GenerationFailed { .. } => "CAMPAIGN_GENERATION_FAILED",
            CampaignError::PublishFailed { .. } => "CAMPAIGN_PUBLISH_FAILED",
        }
    }

    fn error_category(&self) -> ErrorCategory {
        match self {
            CampaignError::InvalidBudget { .. } => ErrorCategory::Validation,
            CampaignError::AiUnavailable { .. } | CampaignError::MalformedAiResponse { .. } => ErrorCategory::AiService,
            CampaignError::DraftNotFound { .. } | CampaignError::GenerationFailed { .. } => ErrorCategory::Database,
            CampaignError::PublishFailed { .. } => ErrorCategory::AdsPlatform,
        }
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            CampaignError::InvalidBudget { .. } | CampaignError::DraftNotFound { .. } => ErrorSeverity::Expected,
            CampaignError::AiUnavailable { .. } => ErrorSeverity::Important,
            CampaignError::MalformedAiResponse { .. } => ErrorSeverity::Minor,
            CampaignError::GenerationFailed { .. } | CampaignError::PublishFailed { .. } => ErrorSeverity::Critical,
        }
    }

    fn suppression_key(&self) -> Option<String> {
        match self {
            CampaignError::AiUnavailable { .. } => Some("campaign_ai_unavailable".to_string()),
            _ => None,
        }
    }

    fn suggested_action(&self) -> Option<String> {
        match self {
            CampaignError::AiUnavailable { .. } => Some("Please try again in a few minutes".to_string()),
            CampaignError::MalformedAiResponse { .. } => Some("Retry generation".to_string()),
            _ => None,
        }
    }
}

impl_into_response!(CampaignError);

impl CampaignError {
    pub fn ai_unavailable<S: Into<String>>(details: S) -> Self {
        Self::AiUnavailable { details: details.into() }
    }

    pub fn malformed_ai_response<S: Into<String>>(details: S) -> Self {
        Self::MalformedAiResponse { details: details.into() }
    }

    pub fn generation_failed<S: Into<String>>(details: S) -> Self {
        Self::GenerationFailed { details: details.into() }
    }

    pub fn publish_failed<S: Into<String>>(details: S) -> Self {
        Self::PublishFailed { details: details.into() }
    }
}
