use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PLAN: &str = "free";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserProfile {
    /// Identity-provider user id
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    /// Subscription plan, `free` until upgraded
    #[serde(default = "default_plan")]
    pub plan: String,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_plan() -> String {
    DEFAULT_PLAN.to_string()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenVerificationRequest {
    /// ID token issued by the identity provider
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenVerificationResponse {
    pub user: UserProfile,
    pub valid: bool,
}
