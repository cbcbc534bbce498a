//! Test utilities shared by unit tests and the `tests/` integration suite.
//!
//! [`TestContext`] wires the full router to an in-memory database and a
//! single wiremock server that stands in for every vendor: the identity
//! provider's signing keys at `/jwks`, the LLM API, and the Meta Graph API
//! under `/meta`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::{net::IpAddr, sync::Arc};
use tower::util::ServiceExt;
use wiremock::{
    matchers::{method, path, path_regex},
    Mock, MockServer, ResponseTemplate,
};

use crate::{
    auth::FirebaseTokenVerifier,
    config::Config,
    db::Database,
    services::{
        ads::{AdsRegistry, MetaAdsClient},
        gemini::GeminiClient,
        website::WebsiteService,
    },
    AppState,
};

pub const TEST_PROJECT_ID: &str = "markezard-test";
pub const TEST_KEY_ID: &str = "test-key-1";
pub const TEST_META_ACCOUNT: &str = "act_1234567890";

const TEST_KEY_PEM: &[u8] = include_bytes!("../test_files/identity_test_key.pem");
const TEST_KEY_MODULUS: &str = "sedlJjYeTQcamWpLPaE6rSC5kXHjOZIntrOvJoyTOjhN6vLkPDd-hQzlwXoT4ARGbddiUedscF50O9Je77n7nsaOS8_DeAgwNnivxjOcoju-b6zM91bJCswroWx5RB5czf60ycNyvB7JlZ3Xp3ZkJxpoEqjmiJPqBO9F43HSVWOa-eOFoeDerabtlVtitp5mfzJYaSKqFvwtE2tk1WDuJZ0RgrrpggXhK9dX9Yh1kJwGoRTmoqiQ1voek37mwTa_dZ2XdlsWipogziLW51STUnqpRlHxr-b4Usiv7lGeraqSi6f2GIG0udQK4k5QKZAMUZ3SWdYZeUv1fmKfNLpEnQ";

/// Public half of the test signing key as a JWK set.
pub fn test_jwks() -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "kid": TEST_KEY_ID,
            "n": TEST_KEY_MODULUS,
            "e": "AQAB"
        }]
    })
}

/// Signs `claims` with the test key, advertising `kid` in the header.
pub fn sign_token(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(TEST_KEY_PEM).expect("test key is valid PEM");
    encode(&header, claims, &key).expect("failed to sign test token")
}

/// Claims of a valid, unexpired ID token for `uid`.
pub fn id_token_claims(uid: &str, email: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": uid,
        "aud": TEST_PROJECT_ID,
        "iss": format!("https://securetoken.google.com/{}", TEST_PROJECT_ID),
        "iat": now,
        "exp": now + 3600,
        "email": email,
        "name": "Test User"
    })
}

/// Gemini `generateContent` reply carrying `text` as the model output.
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

pub struct TestConfigBuilder {
    gemini_keys: Vec<String>,
    meta_credentials: bool,
    max_scraped_products: usize,
    trusted_proxies: Vec<IpAddr>,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self {
            gemini_keys: vec!["test-key-a".to_string(), "test-key-b".to_string()],
            meta_credentials: true,
            max_scraped_products: 50,
            trusted_proxies: Vec::new(),
        }
    }
}

impl TestConfigBuilder {
    pub fn with_gemini_keys(mut self, keys: &[&str]) -> Self {
        self.gemini_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn without_meta_credentials(mut self) -> Self {
        self.meta_credentials = false;
        self
    }

    pub fn with_max_scraped_products(mut self, max: usize) -> Self {
        self.max_scraped_products = max;
        self
    }

    pub fn with_trusted_proxy(mut self, proxy: IpAddr) -> Self {
        self.trusted_proxies.push(proxy);
        self
    }

    /// Config with every vendor URL pointing at `mock_url`.
    pub fn build(self, mock_url: &str) -> Config {
        Config {
            server_address: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            trusted_proxies: self.trusted_proxies,
            firebase_project_id: TEST_PROJECT_ID.to_string(),
            firebase_jwks_url: format!("{}/jwks", mock_url),
            gemini_api_keys: self.gemini_keys,
            gemini_model: "gemini-pro".to_string(),
            gemini_base_url: mock_url.to_string(),
            gemini_max_retries: 2,
            gemini_backoff_base_ms: 1,
            meta_access_token: self.meta_credentials.then(|| "meta-test-token".to_string()),
            meta_ad_account_id: self.meta_credentials.then(|| TEST_META_ACCOUNT.to_string()),
            meta_graph_url: format!("{}/meta", mock_url),
            meta_page_id: Some("page-42".to_string()),
            meta_landing_page_url: "https://shop.example.com".to_string(),
            http_timeout_seconds: 5,
            max_scraped_products: self.max_scraped_products,
        }
    }
}

pub struct TestContext {
    pub app: Router,
    pub server: MockServer,
    pub state: Arc<AppState>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(TestConfigBuilder::default()).await
    }

    pub async fn with_config(config_builder: TestConfigBuilder) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "public, max-age=3600")
                    .set_body_json(test_jwks()),
            )
            .mount(&server)
            .await;

        let config = config_builder.build(&server.uri());
        let db = Database::new_in_memory().await.expect("in-memory database");
        db.migrate().await.expect("schema migration");

        let http_client = reqwest::Client::new();
        let state = Arc::new(AppState {
            db,
            verifier: Arc::new(FirebaseTokenVerifier::from_config(&config, http_client.clone())),
            gemini: Arc::new(GeminiClient::from_config(&config, http_client.clone())),
            ads: Arc::new(AdsRegistry::new(Arc::new(MetaAdsClient::from_config(
                &config,
                http_client.clone(),
            )))),
            website: Arc::new(WebsiteService::from_config(&config, http_client)),
            config,
        });

        Self {
            app: crate::create_router(state.clone()),
            server,
            state,
        }
    }

    /// Bearer token for a user with the given uid.
    pub fn token_for(&self, uid: &str) -> String {
        sign_token(&id_token_claims(uid, &format!("{}@example.com", uid)), TEST_KEY_ID)
    }

    /// Makes every LLM call answer with `text`.
    pub async fn mock_llm_reply(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_reply(text)))
            .mount(&self.server)
            .await;
    }

    /// Makes every LLM call fail with `status`.
    pub async fn mock_llm_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({"error": {"message": "backend unavailable"}})),
            )
            .mount(&self.server)
            .await;
    }

    /// Sends a request through the router and returns the status and JSON body
    /// (`Value::Null` for an empty or non-JSON body).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request_body = match body {
            Some(body) => Body::from(serde_json::to_vec(&body).unwrap()),
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(request_body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body), token).await
    }
}
