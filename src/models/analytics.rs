use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CampaignAnalyticsQuery {
    /// Campaign id on the ads platform
    pub campaign_id: String,
    /// Ads platform name, case-insensitive
    pub platform: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CampaignMetrics {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub roas: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CampaignAnalyticsResponse {
    pub campaign_id: String,
    pub platform: String,
    pub metrics: CampaignMetrics,
    pub last_updated: DateTime<Utc>,
    /// "live" or "mock"
    pub data_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLogEntry {
    pub id: String,
    pub user_id: String,
    pub event_type: String,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub ip_address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AuditLogQuery {
    /// Maximum number of entries, capped at 200
    pub limit: Option<i64>,
}
