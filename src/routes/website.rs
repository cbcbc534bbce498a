use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    auth::AuthUser,
    errors::website::WebsiteError,
    models::{
        PlatformSuggestion, PlatformSuggestionsQuery, PlatformSuggestionsResponse,
        WebsiteAnalysisRequest, WebsiteAnalysisResponse, WebsiteIntegrationRequest,
        WebsiteIntegrationResponse,
    },
    routes::extract::{ApiJson, ApiQuery},
    services::{prompts, website::validate_url},
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/integrate-website", post(integrate_website))
        .route("/analyse-website", post(analyse_website))
        .route("/platform-suggestions", get(platform_suggestions))
}

#[utoipa::path(
    post,
    path = "/integrate-website",
    tag = "website",
    security(
        ("bearer_auth" = [])
    ),
    request_body = WebsiteIntegrationRequest,
    responses(
        (status = 200, description = "Products and site details; empty when nothing could be read", body = WebsiteIntegrationResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 422, description = "URL is not an absolute http(s) URL")
    )
)]
pub async fn integrate_website(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    ApiJson(request): ApiJson<WebsiteIntegrationRequest>,
) -> Result<Json<WebsiteIntegrationResponse>, WebsiteError> {
    let url = validate_url(&request.url)?;
    info!(
        "User {} integrating website {} (platform: {})",
        auth_user.profile.uid, url, request.platform
    );

    let result = state
        .website
        .integrate(request.platform, &url, request.oauth.as_ref())
        .await;

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/analyse-website",
    tag = "website",
    security(
        ("bearer_auth" = [])
    ),
    request_body = WebsiteAnalysisRequest,
    responses(
        (status = 200, description = "Website analysis", body = WebsiteAnalysisResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Website analysis failed")
    )
)]
pub async fn analyse_website(
    State(state): State<Arc<AppState>>,
    _auth_user: AuthUser,
    ApiJson(request): ApiJson<WebsiteAnalysisRequest>,
) -> Result<Json<WebsiteAnalysisResponse>, WebsiteError> {
    info!("Analyzing website data");

    let prompt = prompts::website_analysis_prompt(&request.site_data);
    let result = state
        .gemini
        .generate_structured(&prompt, prompts::website_analysis_settings())
        .await
        .map_err(|e| {
            error!("Website analysis AI call failed: {}", e);
            WebsiteError::AnalysisFailed { details: e.to_string() }
        })?;

    if result.get("strengths").is_none() {
        warn!("AI reply had no strengths, using fallback analysis");
        return Ok(Json(prompts::fallback_website_analysis()));
    }

    Ok(Json(WebsiteAnalysisResponse {
        strengths: string_list(&result["strengths"]),
        weaknesses: string_list(&result["weaknesses"]),
        improvement_suggestions: string_list(&result["improvement_suggestions"]),
        product_positioning: result["product_positioning"].as_str().unwrap_or("").to_string(),
    }))
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

#[utoipa::path(
    get,
    path = "/platform-suggestions",
    tag = "website",
    security(
        ("bearer_auth" = [])
    ),
    params(PlatformSuggestionsQuery),
    responses(
        (status = 200, description = "Ads platforms ranked for the product type", body = PlatformSuggestionsResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Platform suggestions failed")
    )
)]
pub async fn platform_suggestions(
    State(state): State<Arc<AppState>>,
    _auth_user: AuthUser,
    ApiQuery(query): ApiQuery<PlatformSuggestionsQuery>,
) -> Result<Json<PlatformSuggestionsResponse>, WebsiteError> {
    let product_type = query.product_type.as_deref().filter(|p| !p.trim().is_empty());
    info!("Getting platform suggestions for product type: {:?}", product_type);

    let prompt = prompts::platform_suggestions_prompt(product_type);
    let result = state
        .gemini
        .generate_structured(&prompt, prompts::platform_suggestions_settings())
        .await
        .map_err(|e| {
            error!("Platform suggestions AI call failed: {}", e);
            WebsiteError::SuggestionsFailed { details: e.to_string() }
        })?;

    let suggestions = match result.get("suggestions") {
        Some(raw) => serde_json::from_value::<Vec<PlatformSuggestion>>(raw.clone())
            .map_err(|e| WebsiteError::SuggestionsFailed { details: e.to_string() })?,
        None => {
            warn!("AI reply had no suggestions, using fallback list");
            prompts::fallback_platform_suggestions()
        }
    };

    Ok(Json(PlatformSuggestionsResponse { suggestions }))
}
