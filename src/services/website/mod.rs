//! Store integration: pulls a product catalogue and site details out of a
//! merchant website.
//!
//! Each platform tries its richest source first and falls back towards plain
//! HTML scraping:
//!
//! * Shopify: Admin API (with an access token), public `products.json`, scraping
//! * WordPress: WooCommerce REST API (with consumer key and secret), scraping
//! * Custom: scraping
//!
//! Integration never fails outright. When even scraping fails the caller gets
//! an empty catalogue for an "Unknown Site".

use reqwest::Client;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use crate::config::Config;
use crate::errors::website::WebsiteError;
use crate::models::{PlatformType, Product, SiteMeta, StoreCredentials, WebsiteIntegrationResponse};
use crate::monitoring::error_management::{get_error_manager, VendorErrorHandler};

pub mod sanitize;
pub mod scrape;
pub mod shopify;
pub mod woocommerce;

pub(crate) const DEFAULT_CURRENCY: &str = "USD";
pub(crate) const MAX_IMAGES_PER_PRODUCT: usize = 3;
const MAX_SAMPLE_IMAGES: usize = 10;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL has no host: {0}")]
    InvalidUrl(String),
}

/// Parses a store URL, accepting only absolute http(s) URLs with a host.
pub fn validate_url(raw: &str) -> Result<Url, WebsiteError> {
    let url = Url::parse(raw.trim()).map_err(|e| WebsiteError::invalid_url(raw.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(WebsiteError::invalid_url(
            raw.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(WebsiteError::invalid_url(raw.to_string(), "missing host".to_string()));
    }

    Ok(url)
}

pub struct WebsiteService {
    client: Client,
    max_products: usize,
}

impl WebsiteService {
    pub fn new(client: Client, max_products: usize) -> Self {
        Self { client, max_products }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        Self::new(client, config.max_scraped_products)
    }

    pub async fn integrate(
        &self,
        platform: PlatformType,
        url: &Url,
        credentials: Option<&StoreCredentials>,
    ) -> WebsiteIntegrationResponse {
        info!("Integrating {} website: {}", platform, url);

        let result = match platform {
            PlatformType::Shopify => self.integrate_shopify(url, credentials).await,
            PlatformType::Wordpress => self.integrate_wordpress(url, credentials).await,
            PlatformType::Custom => self.integrate_custom(url).await,
        };

        match result {
            Ok(response) => {
                info!(
                    "Found {} products on {} ({} sample images)",
                    response.products.len(),
                    url,
                    response.sample_images.len()
                );
                response
            }
            Err(e) => {
                error!("Website integration failed for {}: {}", url, e);
                get_error_manager()
                    .handle_error(VendorErrorHandler::scrape_failed(url.as_str(), &e.to_string()))
                    .await;
                WebsiteIntegrationResponse::empty()
            }
        }
    }

    async fn integrate_shopify(
        &self,
        url: &Url,
        credentials: Option<&StoreCredentials>,
    ) -> Result<WebsiteIntegrationResponse, ScrapeError> {
        let base = match shopify::store_base(url) {
            Ok(base) => base,
            Err(e) => {
                warn!("Cannot derive Shopify store address from {}: {}", url, e);
                return self.integrate_custom(url).await;
            }
        };

        if let Some(token) = credentials.and_then(|c| c.access_token.as_deref()).filter(|t| !t.is_empty()) {
            match shopify::admin_catalog(&self.client, &base, token).await {
                Ok(Some((products, site_meta))) => return Ok(self.build_response(products, site_meta)),
                Ok(None) => warn!("Shopify Admin API unavailable for {}, trying public feed", base),
                Err(e) => warn!("Shopify Admin API request failed for {}: {}", base, e),
            }
        }

        match shopify::public_products(&self.client, &base).await {
            Ok(Some(products)) => {
                let site_meta = self.fetch_site_meta(url).await;
                return Ok(self.build_response(products, site_meta));
            }
            Ok(None) => warn!("Shopify public feed unavailable for {}, scraping instead", base),
            Err(e) => warn!("Shopify public feed request failed for {}: {}", base, e),
        }

        self.integrate_custom(url).await
    }

    async fn integrate_wordpress(
        &self,
        url: &Url,
        credentials: Option<&StoreCredentials>,
    ) -> Result<WebsiteIntegrationResponse, ScrapeError> {
        let keys = credentials.and_then(|c| match (c.consumer_key.as_deref(), c.consumer_secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => Some((key, secret)),
            _ => None,
        });

        if let Some((key, secret)) = keys {
            match woocommerce::api_products(&self.client, url.as_str(), key, secret, self.max_products).await {
                Ok(Some(products)) => {
                    let site_meta = self.fetch_site_meta(url).await;
                    return Ok(self.build_response(products, site_meta));
                }
                Ok(None) => warn!("WooCommerce API refused request for {}, scraping instead", url),
                Err(e) => warn!("WooCommerce API request failed for {}: {}", url, e),
            }
        }

        self.integrate_custom(url).await
    }

    async fn integrate_custom(&self, url: &Url) -> Result<WebsiteIntegrationResponse, ScrapeError> {
        let html = self.fetch_page(url).await?;
        let site_meta = scrape::site_meta(&html, url);
        let products = scrape::products(&html, url);
        Ok(self.build_response(products, site_meta))
    }

    async fn fetch_page(&self, url: &Url) -> Result<String, ScrapeError> {
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn fetch_site_meta(&self, url: &Url) -> SiteMeta {
        match self.fetch_page(url).await {
            Ok(html) => scrape::site_meta(&html, url),
            Err(e) => {
                warn!("Failed to scrape site metadata from {}: {}", url, e);
                SiteMeta::unknown()
            }
        }
    }

    fn build_response(&self, mut products: Vec<Product>, site_meta: SiteMeta) -> WebsiteIntegrationResponse {
        products.truncate(self.max_products);
        let sample_images = sample_images(&products);
        WebsiteIntegrationResponse {
            products,
            site_meta,
            sample_images,
        }
    }
}

/// Product images in catalogue order, at most ten.
fn sample_images(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .flat_map(|p| p.images.iter().cloned())
        .take(MAX_SAMPLE_IMAGES)
        .collect()
}
