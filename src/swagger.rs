use axum::Router;
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        AdPlatform, AdVariation, AuditLogEntry, CampaignAnalyticsResponse, CampaignDraft,
        CampaignDraftRecord, CampaignGenerationRequest, CampaignGenerationResponse, CampaignGoal,
        CampaignMetrics, CampaignPublishRequest, CampaignPublishResponse, DraftBudget,
        EstimatedPerformance, HealthResponse, PlatformResponse, PlatformSuggestion,
        PlatformSuggestionsResponse, PlatformType, Product, ProductBrief, PublishMode,
        RootResponse, SiteMeta, StoreCredentials, TokenVerificationRequest,
        TokenVerificationResponse, UntappedInterest, UserProfile, WebsiteAnalysisRequest,
        WebsiteAnalysisResponse, WebsiteIntegrationRequest, WebsiteIntegrationResponse,
    },
    AppState,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Service endpoints
        crate::health_check,
        crate::root,
        // Auth endpoints
        crate::routes::auth::verify_token,
        crate::routes::auth::me,
        // Campaign endpoints
        crate::routes::campaign::generate_campaign,
        crate::routes::campaign::publish_campaign,
        crate::routes::campaign::list_campaigns,
        crate::routes::campaign::get_campaign,
        // Website endpoints
        crate::routes::website::integrate_website,
        crate::routes::website::analyse_website,
        crate::routes::website::platform_suggestions,
        // Analytics endpoints
        crate::routes::analytics::campaign_analytics,
        crate::routes::analytics::audit_logs,
    ),
    components(
        schemas(
            HealthResponse, RootResponse, UserProfile, TokenVerificationRequest,
            TokenVerificationResponse, AdPlatform, CampaignGoal, PublishMode, ProductBrief,
            CampaignGenerationRequest, AdVariation, UntappedInterest, DraftBudget, CampaignDraft,
            EstimatedPerformance, CampaignGenerationResponse, CampaignPublishRequest,
            PlatformResponse, CampaignPublishResponse, CampaignDraftRecord, PlatformType,
            StoreCredentials, WebsiteIntegrationRequest, WebsiteAnalysisRequest, Product, SiteMeta,
            WebsiteIntegrationResponse, WebsiteAnalysisResponse, PlatformSuggestion,
            PlatformSuggestionsResponse, CampaignMetrics, CampaignAnalyticsResponse, AuditLogEntry
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "service", description = "Health and service information"),
        (name = "auth", description = "Identity token verification"),
        (name = "campaigns", description = "Campaign generation, drafts and publishing"),
        (name = "website", description = "Store integration and website analysis"),
        (name = "analytics", description = "Campaign metrics and audit trail"),
    ),
    info(
        title = "MarkezardAI API",
        description = "AI-assisted ad campaign generation and publishing for online stores",
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn create_swagger_router() -> Router<Arc<AppState>> {
    SwaggerUi::new("/docs")
        .url("/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/",
            "/auth/verify-token",
            "/auth/me",
            "/generate-campaign",
            "/publish-campaign",
            "/campaigns",
            "/campaigns/{id}",
            "/integrate-website",
            "/analyse-website",
            "/platform-suggestions",
            "/campaign-analytics",
            "/audit-logs",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
