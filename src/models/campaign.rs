use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::{deserialize_lenient_f64, deserialize_lenient_string, deserialize_score};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdPlatform {
    Meta,
    Google,
    Tiktok,
    Linkedin,
    X,
}

impl AdPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdPlatform::Meta => "meta",
            AdPlatform::Google => "google",
            AdPlatform::Tiktok => "tiktok",
            AdPlatform::Linkedin => "linkedin",
            AdPlatform::X => "x",
        }
    }

    /// Case-insensitive lookup used for free-form query parameters.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "meta" => Some(AdPlatform::Meta),
            "google" => Some(AdPlatform::Google),
            "tiktok" => Some(AdPlatform::Tiktok),
            "linkedin" => Some(AdPlatform::Linkedin),
            "x" => Some(AdPlatform::X),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CampaignGoal {
    Awareness,
    Traffic,
    Conversions,
    Leads,
}

impl CampaignGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignGoal::Awareness => "awareness",
            CampaignGoal::Traffic => "traffic",
            CampaignGoal::Conversions => "conversions",
            CampaignGoal::Leads => "leads",
        }
    }
}

impl std::fmt::Display for CampaignGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    #[default]
    DryRun,
    GoLive,
}

impl PublishMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishMode::DryRun => "dry_run",
            PublishMode::GoLive => "go_live",
        }
    }
}

/// The product a campaign is generated for. Unknown keys are ignored, and
/// prices or names sent as the "wrong" JSON type are coerced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ProductBrief {
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_f64")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub currency: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignGenerationRequest {
    pub product: ProductBrief,
    pub platform: AdPlatform,
    /// Daily budget in USD, must be positive
    pub budget: f64,
    /// Target language code
    #[serde(default = "default_language")]
    pub language: String,
    pub goal: CampaignGoal,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct AdVariation {
    pub headline: String,
    pub description: String,
    pub cta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UntappedInterest {
    pub interest: String,
    /// Predicted success, 0-100
    #[serde(deserialize_with = "deserialize_score")]
    pub success_score: u32,
    /// "low", "medium" or "high"
    pub competition: String,
    pub reasoning: String,
}

impl UntappedInterest {
    pub const MAX_SCORE: u32 = 100;

    pub fn validate(&self) -> Result<(), String> {
        if self.success_score > Self::MAX_SCORE {
            return Err(format!(
                "success_score {} for '{}' is outside 0-{}",
                self.success_score,
                self.interest,
                Self::MAX_SCORE
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DraftBudget {
    pub daily_budget: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CampaignDraft {
    pub primary_copy: AdVariation,
    pub variations: Vec<AdVariation>,
    pub creative_instructions: String,
    pub untapped_interests: Vec<UntappedInterest>,
    #[schema(value_type = Object)]
    pub targeting_suggestions: serde_json::Value,
    /// Set once the draft is attached to a product, platform and budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<AdPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<CampaignGoal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<DraftBudget>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EstimatedPerformance {
    pub estimated_daily_reach: i64,
    pub estimated_ctr: f64,
    pub estimated_conversions: i64,
    pub confidence_score: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignGenerationResponse {
    pub campaign_draft: CampaignDraft,
    pub estimated_performance: EstimatedPerformance,
    /// Id of the stored draft record
    pub draft_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignPublishRequest {
    /// Draft document as returned by generation, possibly edited by the client
    #[schema(value_type = Object)]
    pub campaign_draft: serde_json::Value,
    pub platform: AdPlatform,
    #[serde(default)]
    pub publish_mode: PublishMode,
    pub confirm_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PlatformResponse {
    pub platform: String,
    pub campaign_id: Option<String>,
    pub status: String,
    pub message: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignPublishResponse {
    pub publish_mode: PublishMode,
    pub platform_response: PlatformResponse,
    /// Id of the `campaign_publish_attempt` audit entry
    pub audit_log_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignDraftRecord {
    pub id: String,
    pub user_id: String,
    pub platform: AdPlatform,
    pub goal: CampaignGoal,
    pub name: String,
    pub draft: CampaignDraft,
    pub created_at: DateTime<Utc>,
}
