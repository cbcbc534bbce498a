//! Ads platform clients. Publishing is a pass-through: whatever happens at
//! the platform is reported inside a [`PlatformResponse`] rather than as an
//! error.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{
    AdPlatform, CampaignAnalyticsResponse, CampaignMetrics, PlatformResponse, PublishMode,
};

pub mod meta;

pub use meta::MetaAdsClient;

/// Shortest confirm token accepted for live publishing is this plus one.
const MIN_CONFIRM_TOKEN_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum AdsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{platform} credentials are not configured")]
    NotConfigured { platform: &'static str },
    #[error("Ads API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("No analytics data found for campaign: {campaign_id}")]
    NoData { campaign_id: String },
}

#[async_trait]
pub trait AdPlatformClient: Send + Sync {
    fn platform(&self) -> AdPlatform;

    /// Validates or publishes `draft`. Never fails: platform and transport
    /// errors come back as a response with an error status.
    async fn publish(
        &self,
        draft: &Value,
        mode: PublishMode,
        confirm_token: Option<&str>,
    ) -> PlatformResponse;

    async fn campaign_analytics(&self, campaign_id: &str) -> Result<CampaignAnalyticsResponse, AdsError>;
}

/// Stand-in for platforms without a real integration yet
pub struct PlaceholderPlatform {
    platform: AdPlatform,
}

impl PlaceholderPlatform {
    pub fn new(platform: AdPlatform) -> Self {
        Self { platform }
    }

    /// Canned metrics reported for any platform without live analytics.
    pub fn mock_analytics(campaign_id: &str, platform: &str) -> CampaignAnalyticsResponse {
        CampaignAnalyticsResponse {
            campaign_id: campaign_id.to_string(),
            platform: platform.to_string(),
            metrics: CampaignMetrics {
                impressions: 8500,
                clicks: 210,
                conversions: 12,
                spend: 65.75,
                ctr: 2.47,
                cpc: 0.31,
                roas: 2.8,
            },
            last_updated: Utc::now(),
            data_source: "mock".to_string(),
        }
    }
}

#[async_trait]
impl AdPlatformClient for PlaceholderPlatform {
    fn platform(&self) -> AdPlatform {
        self.platform
    }

    async fn publish(&self, _draft: &Value, _mode: PublishMode, _confirm_token: Option<&str>) -> PlatformResponse {
        PlatformResponse {
            platform: self.platform.to_string(),
            campaign_id: None,
            status: "not_implemented".to_string(),
            message: format!("{} integration not yet implemented", title_case(self.platform.as_str())),
            details: json!({"mock_mode": true}),
        }
    }

    async fn campaign_analytics(&self, campaign_id: &str) -> Result<CampaignAnalyticsResponse, AdsError> {
        Ok(Self::mock_analytics(campaign_id, self.platform.as_str()))
    }
}

/// One client per supported platform
pub struct AdsRegistry {
    clients: HashMap<AdPlatform, Arc<dyn AdPlatformClient>>,
}

impl AdsRegistry {
    /// Meta goes to `meta`; every other platform gets a placeholder.
    pub fn new(meta: Arc<dyn AdPlatformClient>) -> Self {
        let mut clients: HashMap<AdPlatform, Arc<dyn AdPlatformClient>> = HashMap::new();
        for platform in [AdPlatform::Google, AdPlatform::Tiktok, AdPlatform::Linkedin, AdPlatform::X] {
            clients.insert(platform, Arc::new(PlaceholderPlatform::new(platform)));
        }
        clients.insert(meta.platform(), meta);
        Self { clients }
    }

    pub fn client(&self, platform: AdPlatform) -> Option<Arc<dyn AdPlatformClient>> {
        self.clients.get(&platform).cloned()
    }
}

/// Rejection for a live publish without a usable confirm token.
pub(crate) fn confirm_token_rejection(platform: AdPlatform, token: Option<&str>) -> Option<PlatformResponse> {
    let (message, code) = match token {
        None | Some("") => ("Confirmation token required for live publishing", "MISSING_CONFIRM_TOKEN"),
        Some(t) if t.chars().count() <= MIN_CONFIRM_TOKEN_LEN => {
            ("Invalid confirmation token", "INVALID_CONFIRM_TOKEN")
        }
        Some(_) => return None,
    };

    Some(error_response(platform, message, json!({"error_code": code})))
}

pub(crate) fn error_response(platform: AdPlatform, message: impl Into<String>, details: Value) -> PlatformResponse {
    PlatformResponse {
        platform: platform.to_string(),
        campaign_id: None,
        status: "error".to_string(),
        message: message.into(),
        details,
    }
}

pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
