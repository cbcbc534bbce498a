use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    auth::AuthUser,
    errors::{campaign::CampaignError, ApiError},
    models::{
        AdVariation, CampaignDraft, CampaignDraftRecord, CampaignGenerationRequest,
        CampaignGenerationResponse, CampaignPublishRequest, CampaignPublishResponse, DraftBudget,
        EstimatedPerformance, UntappedInterest,
    },
    routes::extract::{ApiJson, ClientInfo},
    services::{ads::title_case, prompts},
    AppState,
};

const DRAFT_LIST_LIMIT: i64 = 50;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate-campaign", post(generate_campaign))
        .route("/publish-campaign", post(publish_campaign))
        .route("/campaigns", get(list_campaigns))
        .route("/campaigns/{id}", get(get_campaign))
}

#[utoipa::path(
    post,
    path = "/generate-campaign",
    tag = "campaigns",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CampaignGenerationRequest,
    responses(
        (status = 200, description = "Generated campaign draft", body = CampaignGenerationResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 422, description = "Budget must be greater than zero"),
        (status = 500, description = "AI response could not be parsed"),
        (status = 503, description = "AI service temporarily unavailable")
    )
)]
pub async fn generate_campaign(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    ApiJson(request): ApiJson<CampaignGenerationRequest>,
) -> Result<Json<CampaignGenerationResponse>, CampaignError> {
    if !(request.budget > 0.0) {
        return Err(CampaignError::InvalidBudget { budget: request.budget });
    }

    info!(
        "Generating {} campaign for user {} (goal: {})",
        request.platform, auth_user.profile.uid, request.goal
    );

    let prompt = prompts::campaign_prompt(&request);
    let result = state
        .gemini
        .generate_structured(&prompt, prompts::campaign_settings())
        .await
        .map_err(|e| {
            error!("Campaign generation AI call failed: {}", e);
            CampaignError::ai_unavailable(e.to_string())
        })?;

    let budget = request.budget;
    let (mut draft, estimated_performance) = if result.get("primary_copy").is_some() {
        let draft = parse_ai_draft(&result).map_err(|e| {
            error!("Failed to parse campaign result: {}", e);
            CampaignError::malformed_ai_response(e)
        })?;
        let interests = draft.untapped_interests.len() as i64;
        let performance = EstimatedPerformance {
            estimated_daily_reach: (budget * 100.0) as i64,
            estimated_ctr: 2.5,
            estimated_conversions: ((budget * 0.02) as i64).max(1),
            confidence_score: (70 + interests).min(95),
        };
        (draft, performance)
    } else {
        warn!("AI reply had no primary_copy, using fallback campaign");
        let performance = EstimatedPerformance {
            estimated_daily_reach: (budget * 100.0) as i64,
            estimated_ctr: 2.0,
            estimated_conversions: ((budget * 0.015) as i64).max(1),
            confidence_score: 75,
        };
        (prompts::fallback_campaign_draft(&request.product), performance)
    };

    let name = format!(
        "{} - {} Campaign",
        request.product.name.as_deref().unwrap_or("Product"),
        title_case(request.platform.as_str())
    );
    draft.name = Some(name.clone());
    draft.platform = Some(request.platform);
    draft.goal = Some(request.goal);
    draft.budget = Some(DraftBudget { daily_budget: budget });

    let uid = &auth_user.profile.uid;
    let record = state
        .db
        .create_campaign_draft(uid, &name, request.platform, request.goal, &draft)
        .await
        .map_err(|e| {
            error!("Failed to store campaign draft for {}: {}", uid, e);
            CampaignError::generation_failed(e.to_string())
        })?;

    if let Err(e) = state.db.increment_campaigns_created(uid).await {
        warn!("Failed to update campaign counter for {}: {}", uid, e);
    }

    Ok(Json(CampaignGenerationResponse {
        campaign_draft: draft,
        estimated_performance,
        draft_id: record.id,
    }))
}

/// Builds a draft from the model's reply. Any shape mismatch is an error.
fn parse_ai_draft(result: &Value) -> Result<CampaignDraft, String> {
    let primary_copy: AdVariation =
        serde_json::from_value(result["primary_copy"].clone()).map_err(|e| format!("primary_copy: {}", e))?;

    let variations: Vec<AdVariation> = match result.get("variations") {
        Some(v) if !v.is_null() => serde_json::from_value(v.clone()).map_err(|e| format!("variations: {}", e))?,
        _ => Vec::new(),
    };

    let untapped_interests: Vec<UntappedInterest> = match result.get("untapped_interests") {
        Some(v) if !v.is_null() => {
            serde_json::from_value(v.clone()).map_err(|e| format!("untapped_interests: {}", e))?
        }
        _ => Vec::new(),
    };
    for interest in &untapped_interests {
        interest.validate()?;
    }

    Ok(CampaignDraft {
        primary_copy,
        variations,
        creative_instructions: result["creative_instructions"].as_str().unwrap_or("").to_string(),
        untapped_interests,
        targeting_suggestions: result
            .get("targeting_suggestions")
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| json!({})),
        name: None,
        platform: None,
        goal: None,
        budget: None,
    })
}

#[utoipa::path(
    get,
    path = "/campaigns",
    tag = "campaigns",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's campaign drafts, newest first", body = Vec<CampaignDraftRecord>),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> Result<Json<Vec<CampaignDraftRecord>>, ApiError> {
    let drafts = state
        .db
        .list_campaign_drafts(&auth_user.profile.uid, DRAFT_LIST_LIMIT)
        .await
        .map_err(|e| {
            error!("Failed to list campaign drafts: {}", e);
            ApiError::internal_server_error(e.to_string())
        })?;

    Ok(Json(drafts))
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "campaigns",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = String, Path, description = "Campaign draft id")
    ),
    responses(
        (status = 200, description = "Campaign draft", body = CampaignDraftRecord),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 404, description = "Campaign draft not found")
    )
)]
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CampaignDraftRecord>, CampaignError> {
    let draft = state
        .db
        .get_campaign_draft(&auth_user.profile.uid, &id)
        .await
        .map_err(|e| CampaignError::generation_failed(e.to_string()))?
        .ok_or(CampaignError::DraftNotFound { id })?;

    Ok(Json(draft))
}

#[utoipa::path(
    post,
    path = "/publish-campaign",
    tag = "campaigns",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CampaignPublishRequest,
    responses(
        (status = 200, description = "Platform outcome, including platform-side failures", body = CampaignPublishResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 500, description = "Campaign publishing failed")
    )
)]
pub async fn publish_campaign(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    client: ClientInfo,
    ApiJson(request): ApiJson<CampaignPublishRequest>,
) -> Result<Json<CampaignPublishResponse>, CampaignError> {
    let uid = &auth_user.profile.uid;
    info!(
        "Publishing campaign to {} (mode: {}) for user {}",
        request.platform,
        request.publish_mode.as_str(),
        uid
    );

    match publish_with_audit(&state, uid, &request, &client).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Campaign publishing failed: {}", e);
            let details = json!({
                "error": e.to_string(),
                "platform": request.platform.as_str(),
            });
            if let Err(log_err) = state.db.log_audit_event(uid, "campaign_publish_error", &details).await {
                warn!("Failed to record publish error in audit log: {}", log_err);
            }
            Err(CampaignError::publish_failed(e.to_string()))
        }
    }
}

async fn publish_with_audit(
    state: &AppState,
    uid: &str,
    request: &CampaignPublishRequest,
    client: &ClientInfo,
) -> anyhow::Result<CampaignPublishResponse> {
    let mut audit_details = json!({
        "platform": request.platform.as_str(),
        "publish_mode": request.publish_mode.as_str(),
        "campaign_name": request.campaign_draft["name"].as_str().unwrap_or("Unknown"),
        "ip_address": client.ip_address,
        "user_agent": client.user_agent,
    });

    let audit_log_id = state
        .db
        .log_audit_event(uid, "campaign_publish_attempt", &audit_details)
        .await?;

    let platform_client = state
        .ads
        .client(request.platform)
        .ok_or_else(|| anyhow!("No ads client registered for {}", request.platform))?;

    let platform_response = platform_client
        .publish(
            &request.campaign_draft,
            request.publish_mode,
            request.confirm_token.as_deref(),
        )
        .await;

    audit_details["result"] = Value::String(platform_response.status.clone());
    state
        .db
        .log_audit_event(uid, "campaign_publish_result", &audit_details)
        .await?;

    Ok(CampaignPublishResponse {
        publish_mode: request.publish_mode,
        platform_response,
        audit_log_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ai_draft_defaults_optional_sections() {
        let reply = json!({
            "primary_copy": {"headline": "H", "description": "D", "cta": "Shop Now"}
        });

        let draft = parse_ai_draft(&reply).unwrap();
        assert!(draft.variations.is_empty());
        assert!(draft.untapped_interests.is_empty());
        assert_eq!(draft.creative_instructions, "");
        assert_eq!(draft.targeting_suggestions, json!({}));
    }

    #[test]
    fn test_parse_ai_draft_rejects_bad_shapes() {
        let missing_cta = json!({"primary_copy": {"headline": "H", "description": "D"}});
        assert!(parse_ai_draft(&missing_cta).is_err());

        let score_out_of_range = json!({
            "primary_copy": {"headline": "H", "description": "D", "cta": "C"},
            "untapped_interests": [
                {"interest": "bouldering", "success_score": 140, "competition": "low", "reasoning": "r"}
            ]
        });
        let err = parse_ai_draft(&score_out_of_range).unwrap_err();
        assert!(err.contains("bouldering"));
    }
}
