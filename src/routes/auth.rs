use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    auth::{authenticate, AuthUser},
    errors::auth::AuthError,
    models::{TokenVerificationRequest, TokenVerificationResponse, UserProfile},
    routes::extract::ApiJson,
    AppState,
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify-token", post(verify_token))
        .route("/me", get(me))
}

#[utoipa::path(
    post,
    path = "/auth/verify-token",
    tag = "auth",
    request_body = TokenVerificationRequest,
    responses(
        (status = 200, description = "Token is valid", body = TokenVerificationResponse),
        (status = 401, description = "Invalid authentication token"),
        (status = 500, description = "User profile could not be stored")
    )
)]
pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<TokenVerificationRequest>,
) -> Result<Json<TokenVerificationResponse>, AuthError> {
    let user = authenticate(&state, &request.token).await?;
    info!("Verified token for user {}", user.uid);

    Ok(Json(TokenVerificationResponse { user, valid: true }))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current user profile", body = UserProfile),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn me(auth_user: AuthUser) -> Json<UserProfile> {
    Json(auth_user.profile)
}
