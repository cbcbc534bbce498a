use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, warn};

use super::{confirm_token_rejection, error_response, AdPlatformClient, AdsError};
use crate::config::Config;
use crate::models::{
    AdPlatform, CampaignAnalyticsResponse, CampaignMetrics, PlatformResponse, PublishMode,
};
use crate::utils::{is_truthy, lenient_f64, short_hash};

const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_TARGETED_INTERESTS: usize = 10;
const MAX_VARIATION_ADS: usize = 2;
const BASE_AUDIENCE_SIZE: f64 = 1_000_000.0;
/// Revenue per conversion assumed when estimating ROAS
const ESTIMATED_CONVERSION_VALUE: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct MetaCredentials {
    pub access_token: String,
    pub ad_account_id: String,
}

/// Meta Marketing (Graph) API client. Everything it creates starts PAUSED.
pub struct MetaAdsClient {
    graph_url: String,
    credentials: Option<MetaCredentials>,
    page_id: Option<String>,
    landing_page_url: String,
    client: reqwest::Client,
}

/// Outcome of one create call: the new object's id, or the API's error body.
type StageResult = Result<String, Value>;

impl MetaAdsClient {
    pub fn new(graph_url: impl Into<String>, credentials: Option<MetaCredentials>, client: reqwest::Client) -> Self {
        Self {
            graph_url: graph_url.into().trim_end_matches('/').to_string(),
            credentials,
            page_id: None,
            landing_page_url: "https://example.com".to_string(),
            client,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let credentials = match (&config.meta_access_token, &config.meta_ad_account_id) {
            (Some(access_token), Some(ad_account_id)) => {
                info!("Meta Ads client initialized for account: {}", ad_account_id);
                Some(MetaCredentials {
                    access_token: access_token.clone(),
                    ad_account_id: ad_account_id.clone(),
                })
            }
            _ => None,
        };

        let mut meta = Self::new(&config.meta_graph_url, credentials, client);
        meta.page_id = config.meta_page_id.clone();
        meta.landing_page_url = config.meta_landing_page_url.clone();
        meta
    }

    fn credentials(&self) -> Result<&MetaCredentials, AdsError> {
        self.credentials
            .as_ref()
            .ok_or(AdsError::NotConfigured { platform: "Meta Ads" })
    }

    async fn dry_run(&self, draft: &Value) -> PlatformResponse {
        let mut errors = validate_draft(draft);
        if errors.is_empty() && !is_truthy(&draft["name"]) {
            errors.push("Campaign name is required".to_string());
        }
        if !errors.is_empty() {
            return PlatformResponse {
                platform: AdPlatform::Meta.to_string(),
                campaign_id: None,
                status: "validation_failed".to_string(),
                message: "Campaign validation failed".to_string(),
                details: json!({ "errors": errors }),
            };
        }

        if !self.test_connection().await {
            return PlatformResponse {
                platform: AdPlatform::Meta.to_string(),
                campaign_id: None,
                status: "api_error".to_string(),
                message: "API connection test failed".to_string(),
                details: json!({"error": "Unable to connect to Meta Ads API"}),
            };
        }

        PlatformResponse {
            platform: AdPlatform::Meta.to_string(),
            campaign_id: Some(format!("dry_run_{}", generate_campaign_id())),
            status: "dry_run_success".to_string(),
            message: "Campaign validated successfully - ready for live publishing".to_string(),
            details: json!({
                "estimated_daily_reach": estimate_reach(draft),
                "estimated_daily_spend": draft["budget"].get("daily_budget").cloned().unwrap_or(json!(0)),
                "targeting_audience_size": estimate_audience_size(draft),
                "validation_passed": true,
            }),
        }
    }

    async fn live_publish(&self, draft: &Value) -> Result<PlatformResponse, AdsError> {
        let campaign_id = match self.create_campaign(draft).await? {
            Ok(id) => id,
            Err(body) => return Ok(stage_failed("campaign_creation_failed", "Failed to create campaign", body)),
        };

        let adset_id = match self.create_ad_set(&campaign_id, draft).await? {
            Ok(id) => id,
            Err(body) => return Ok(stage_failed("adset_creation_failed", "Failed to create ad set", body)),
        };

        let ad_ids = self.create_ads(&adset_id, draft).await?;
        if ad_ids.is_empty() {
            return Ok(stage_failed(
                "ads_creation_failed",
                "Failed to create ads",
                json!("No ads created successfully"),
            ));
        }

        info!("Published Meta campaign {} with {} ad(s)", campaign_id, ad_ids.len());
        Ok(PlatformResponse {
            platform: AdPlatform::Meta.to_string(),
            campaign_id: Some(campaign_id.clone()),
            status: "live_published".to_string(),
            message: "Campaign published successfully".to_string(),
            details: json!({
                "campaign_id": campaign_id,
                "adset_id": adset_id,
                "ad_ids": ad_ids,
                "published_at": Utc::now().to_rfc3339(),
            }),
        })
    }

    async fn create_campaign(&self, draft: &Value) -> Result<StageResult, AdsError> {
        let creds = self.credentials()?;
        let url = format!("{}/{}/campaigns", self.graph_url, creds.ad_account_id);
        let form = [
            ("name", draft["name"].as_str().unwrap_or("MarkezardAI Campaign").to_string()),
            ("objective", map_objective(draft["goal"].as_str().unwrap_or("conversions")).to_string()),
            ("status", "PAUSED".to_string()),
            ("access_token", creds.access_token.clone()),
        ];
        self.post_form(&url, &form).await
    }

    async fn create_ad_set(&self, campaign_id: &str, draft: &Value) -> Result<StageResult, AdsError> {
        let creds = self.credentials()?;
        let url = format!("{}/{}/adsets", self.graph_url, creds.ad_account_id);
        let daily_budget = draft["budget"]["daily_budget"].as_f64().unwrap_or(1000.0);
        let form = [
            ("name", format!("{} - Ad Set", draft["name"].as_str().unwrap_or("Campaign"))),
            ("campaign_id", campaign_id.to_string()),
            // Graph API budgets are in cents
            ("daily_budget", ((daily_budget * 100.0) as i64).to_string()),
            ("billing_event", "IMPRESSIONS".to_string()),
            ("optimization_goal", "CONVERSIONS".to_string()),
            ("targeting", build_targeting(draft).to_string()),
            ("status", "PAUSED".to_string()),
            ("access_token", creds.access_token.clone()),
        ];
        self.post_form(&url, &form).await
    }

    async fn create_ads(&self, adset_id: &str, draft: &Value) -> Result<Vec<String>, AdsError> {
        let mut ads: Vec<(&Value, String)> = Vec::new();
        if is_truthy(&draft["primary_copy"]) {
            ads.push((&draft["primary_copy"], "Primary".to_string()));
        }
        if let Some(variations) = draft["variations"].as_array() {
            for (i, variation) in variations.iter().take(MAX_VARIATION_ADS).enumerate() {
                ads.push((variation, format!("Variation {}", i + 1)));
            }
        }

        let mut ad_ids = Vec::new();
        for (copy, suffix) in ads {
            match self.create_single_ad(adset_id, copy, &suffix).await? {
                Ok(id) => ad_ids.push(id),
                Err(body) => warn!("Meta rejected ad '{}': {}", suffix, body),
            }
        }
        Ok(ad_ids)
    }

    async fn create_single_ad(&self, adset_id: &str, copy: &Value, name_suffix: &str) -> Result<StageResult, AdsError> {
        let creds = self.credentials()?;
        let url = format!("{}/{}/ads", self.graph_url, creds.ad_account_id);
        let creative = json!({
            "object_story_spec": {
                "page_id": self.page_id.as_deref().unwrap_or_default(),
                "link_data": {
                    "message": copy["description"].as_str().unwrap_or(""),
                    "link": self.landing_page_url,
                    "name": copy["headline"].as_str().unwrap_or(""),
                    "call_to_action": {
                        "type": map_cta(copy["cta"].as_str().unwrap_or("LEARN_MORE"))
                    }
                }
            }
        });
        let form = [
            ("name", format!("MarkezardAI Ad - {}", name_suffix)),
            ("adset_id", adset_id.to_string()),
            ("creative", creative.to_string()),
            ("status", "PAUSED".to_string()),
            ("access_token", creds.access_token.clone()),
        ];
        self.post_form(&url, &form).await
    }

    async fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<StageResult, AdsError> {
        let response = self.client.post(url).form(form).send().await?;
        let status = response.status();
        let raw = response.text().await?;
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

        match body["id"].as_str() {
            Some(id) if status.as_u16() == 200 => Ok(Ok(id.to_string())),
            _ => Ok(Err(body)),
        }
    }

    async fn test_connection(&self) -> bool {
        let Ok(creds) = self.credentials() else {
            return false;
        };
        let url = format!("{}/me", self.graph_url);

        match self
            .client
            .get(&url)
            .query(&[("access_token", creds.access_token.as_str())])
            .timeout(CONNECTION_TEST_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().as_u16() == 200,
            Err(e) => {
                error!("API connection test failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl AdPlatformClient for MetaAdsClient {
    fn platform(&self) -> AdPlatform {
        AdPlatform::Meta
    }

    async fn publish(&self, draft: &Value, mode: PublishMode, confirm_token: Option<&str>) -> PlatformResponse {
        if mode == PublishMode::GoLive {
            if let Some(rejection) = confirm_token_rejection(AdPlatform::Meta, confirm_token) {
                return rejection;
            }
        }

        if let Err(e) = self.credentials() {
            return error_response(
                AdPlatform::Meta,
                format!("Publishing failed: {}", e),
                json!({"error": e.to_string(), "error_code": "META_NOT_CONFIGURED"}),
            );
        }

        match mode {
            PublishMode::DryRun => self.dry_run(draft).await,
            PublishMode::GoLive => match self.live_publish(draft).await {
                Ok(response) => response,
                Err(e) => {
                    error!("Live publishing failed: {}", e);
                    error_response(
                        AdPlatform::Meta,
                        format!("Live publishing failed: {}", e),
                        json!({"error": e.to_string()}),
                    )
                }
            },
        }
    }

    async fn campaign_analytics(&self, campaign_id: &str) -> Result<CampaignAnalyticsResponse, AdsError> {
        let creds = self.credentials()?;
        let url = format!("{}/{}/insights", self.graph_url, campaign_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_token", creds.access_token.as_str()),
                ("fields", "impressions,clicks,spend,conversions,ctr,cpc"),
                ("date_preset", "last_7_days"),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            error!("Meta Ads API error {} for campaign {}", status, campaign_id);
            return Err(AdsError::Api { status, body });
        }

        let result: Value = response.json().await?;
        let row = result["data"]
            .as_array()
            .and_then(|rows| rows.first())
            .ok_or_else(|| AdsError::NoData { campaign_id: campaign_id.to_string() })?;

        info!("Retrieved analytics for campaign: {}", campaign_id);
        Ok(CampaignAnalyticsResponse {
            campaign_id: campaign_id.to_string(),
            platform: AdPlatform::Meta.to_string(),
            metrics: parse_insights(row),
            last_updated: Utc::now(),
            data_source: "live".to_string(),
        })
    }
}

fn stage_failed(status: &str, message: &str, error_body: Value) -> PlatformResponse {
    warn!("Meta publish stopped at {}: {}", status, error_body);
    PlatformResponse {
        platform: AdPlatform::Meta.to_string(),
        campaign_id: None,
        status: status.to_string(),
        message: message.to_string(),
        details: json!({"success": false, "error": error_body}),
    }
}

fn validate_draft(draft: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let primary = &draft["primary_copy"];

    if !is_truthy(primary) {
        errors.push("Missing primary ad copy".to_string());
    }
    if !is_truthy(&primary["headline"]) {
        errors.push("Missing headline in primary copy".to_string());
    }
    if !is_truthy(&primary["description"]) {
        errors.push("Missing description in primary copy".to_string());
    }
    match draft["budget"]["daily_budget"].as_f64() {
        Some(budget) if budget > 0.0 => {}
        _ => errors.push("Invalid or missing daily budget".to_string()),
    }
    errors
}

pub fn map_objective(goal: &str) -> &'static str {
    match goal {
        "awareness" => "BRAND_AWARENESS",
        "traffic" => "LINK_CLICKS",
        "leads" => "LEAD_GENERATION",
        _ => "CONVERSIONS",
    }
}

pub fn map_cta(cta: &str) -> &'static str {
    let cta = cta.to_lowercase();
    if cta.contains("shop") || cta.contains("buy") {
        "SHOP_NOW"
    } else if cta.contains("sign") {
        "SIGN_UP"
    } else {
        "LEARN_MORE"
    }
}

fn build_targeting(draft: &Value) -> Value {
    let mut targeting = json!({
        "geo_locations": {"countries": ["US"]},
        "age_min": 18,
        "age_max": 65,
    });

    let interests: Vec<Value> = draft["untapped_interests"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["interest"].as_str())
                .take(MAX_TARGETED_INTERESTS)
                .map(|name| json!({"id": short_hash(name), "name": name}))
                .collect()
        })
        .unwrap_or_default();

    if !interests.is_empty() {
        targeting["interests"] = Value::Array(interests);
    }
    targeting
}

fn estimate_reach(draft: &Value) -> i64 {
    let budget = draft["budget"]["daily_budget"].as_f64().unwrap_or(10.0);
    (budget * 100.0) as i64
}

/// Each targeted interest narrows the audience by 10%, down to a 10% floor.
fn estimate_audience_size(draft: &Value) -> i64 {
    let interests = draft["untapped_interests"].as_array().map(Vec::len).unwrap_or(0);
    if interests == 0 {
        return BASE_AUDIENCE_SIZE as i64;
    }
    let reduction = (1.0 - interests as f64 * 0.1).max(0.1);
    (BASE_AUDIENCE_SIZE * reduction) as i64
}

fn generate_campaign_id() -> String {
    let seed = format!("markezard_{}_{}", Utc::now().timestamp_nanos_opt().unwrap_or_default(), uuid::Uuid::new_v4());
    short_hash(&seed)
}

/// Insights values arrive as strings ("123", "4.56") or numbers.
fn parse_insights(row: &Value) -> CampaignMetrics {
    let number = |key: &str| lenient_f64(&row[key]).unwrap_or(0.0);
    let conversions = number("conversions");
    let spend = lenient_f64(&row["spend"]).unwrap_or(1.0);

    CampaignMetrics {
        impressions: number("impressions") as i64,
        clicks: number("clicks") as i64,
        conversions: conversions as i64,
        spend: number("spend"),
        ctr: number("ctr"),
        cpc: number("cpc"),
        roas: conversions * ESTIMATED_CONVERSION_VALUE / spend.max(1.0),
    }
}
