use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    auth::AuthUser,
    errors::analytics::AnalyticsError,
    models::{AdPlatform, AuditLogEntry, AuditLogQuery, CampaignAnalyticsQuery, CampaignAnalyticsResponse},
    routes::extract::ApiQuery,
    services::ads::PlaceholderPlatform,
    AppState,
};

const DEFAULT_AUDIT_LIMIT: i64 = 50;
const MAX_AUDIT_LIMIT: i64 = 200;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/campaign-analytics", get(campaign_analytics))
        .route("/audit-logs", get(audit_logs))
}

#[utoipa::path(
    get,
    path = "/campaign-analytics",
    tag = "analytics",
    security(
        ("bearer_auth" = [])
    ),
    params(CampaignAnalyticsQuery),
    responses(
        (status = 200, description = "Campaign metrics, live for Meta and canned elsewhere", body = CampaignAnalyticsResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Analytics retrieval failed")
    )
)]
pub async fn campaign_analytics(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<CampaignAnalyticsQuery>,
) -> Result<Json<CampaignAnalyticsResponse>, AnalyticsError> {
    info!(
        "User {} requesting analytics for {} campaign {}",
        auth_user.profile.uid, query.platform, query.campaign_id
    );

    // Unrecognised platform names still get canned metrics.
    let client = match AdPlatform::parse(&query.platform).and_then(|p| state.ads.client(p)) {
        Some(client) => client,
        None => return Ok(Json(PlaceholderPlatform::mock_analytics(&query.campaign_id, &query.platform))),
    };

    let analytics = client
        .campaign_analytics(&query.campaign_id)
        .await
        .map_err(|e| {
            error!("Failed to get analytics for {}: {}", query.campaign_id, e);
            AnalyticsError::RetrievalFailed { details: e.to_string() }
        })?;

    Ok(Json(analytics))
}

#[utoipa::path(
    get,
    path = "/audit-logs",
    tag = "analytics",
    security(
        ("bearer_auth" = [])
    ),
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Caller's audit entries, newest first", body = Vec<AuditLogEntry>),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Audit log retrieval failed")
    )
)]
pub async fn audit_logs(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, AnalyticsError> {
    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, MAX_AUDIT_LIMIT);

    let entries = state
        .db
        .list_audit_events(&auth_user.profile.uid, limit)
        .await
        .map_err(|e| AnalyticsError::AuditLogFailed { details: e.to_string() })?;

    Ok(Json(entries))
}
