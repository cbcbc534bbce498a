pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod monitoring;
pub mod routes;
pub mod services;
pub mod swagger;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod tests;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use auth::FirebaseTokenVerifier;
use config::Config;
use db::Database;
use models::{HealthResponse, RootResponse};
use services::{ads::AdsRegistry, gemini::GeminiClient, website::WebsiteService};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub verifier: Arc<FirebaseTokenVerifier>,
    pub gemini: Arc<GeminiClient>,
    pub ads: Arc<AdsRegistry>,
    pub website: Arc<WebsiteService>,
}

/// Health check endpoint for monitoring
#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "MarkezardAI API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    responses(
        (status = 200, description = "Service information", body = RootResponse)
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "MarkezardAI API".to_string(),
        docs: "/docs".to_string(),
    })
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", routes::auth::router())
        .merge(routes::campaign::router())
        .merge(routes::website::router())
        .merge(routes::analytics::router())
        .merge(swagger::create_swagger_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
