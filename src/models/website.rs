use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    Shopify,
    Wordpress,
    Custom,
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformType::Shopify => write!(f, "shopify"),
            PlatformType::Wordpress => write!(f, "wordpress"),
            PlatformType::Custom => write!(f, "custom"),
        }
    }
}

/// Credentials for store APIs; every field is optional and unknown keys are ignored
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StoreCredentials {
    /// Shopify Admin API access token
    pub access_token: Option<String>,
    /// WooCommerce REST API consumer key
    pub consumer_key: Option<String>,
    /// WooCommerce REST API consumer secret
    pub consumer_secret: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebsiteIntegrationRequest {
    pub platform: PlatformType,
    pub url: String,
    #[serde(default)]
    pub oauth: Option<StoreCredentials>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WebsiteAnalysisRequest {
    /// Usually the body of a previous integration response
    #[schema(value_type = Object)]
    pub site_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,
    /// Absolute image URLs, at most three
    pub images: Vec<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SiteMeta {
    pub title: String,
    pub description: String,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    #[serde(default)]
    pub theme_colors: Vec<String>,
}

impl SiteMeta {
    pub fn unknown() -> Self {
        Self {
            title: "Unknown Site".to_string(),
            description: String::new(),
            logo: None,
            favicon: None,
            theme_colors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct WebsiteIntegrationResponse {
    pub products: Vec<Product>,
    pub site_meta: SiteMeta,
    pub sample_images: Vec<String>,
}

impl WebsiteIntegrationResponse {
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            site_meta: SiteMeta::unknown(),
            sample_images: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct WebsiteAnalysisResponse {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub product_positioning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PlatformSuggestion {
    pub platform: String,
    /// Suitability score, 0-100
    pub score: f64,
    pub rationale: String,
    pub estimated_reach: i64,
    /// "low", "medium" or "high"
    pub cost_effectiveness: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PlatformSuggestionsResponse {
    pub suggestions: Vec<PlatformSuggestion>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PlatformSuggestionsQuery {
    /// Product type to tailor suggestions for
    pub product_type: Option<String>,
}
