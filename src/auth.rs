use axum::{
    extract::FromRequestParts,
    http::{header::CACHE_CONTROL, request::Parts, HeaderMap},
};
use jsonwebtoken::{
    decode, decode_header, errors::ErrorKind, jwk::JwkSet, Algorithm, DecodingKey, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{config::Config, errors::auth::AuthError, models::UserProfile, AppState};

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const MAX_SUBJECT_LEN: usize = 128;
const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(3600);

/// Claims of a Firebase ID token that the API cares about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    expires_at: Instant,
}

/// Verifies identity-provider ID tokens against the provider's published
/// signing keys.
pub struct FirebaseTokenVerifier {
    project_id: String,
    jwks_url: String,
    http_client: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            http_client,
            cache: RwLock::new(None),
        }
    }

    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        Self::new(&config.firebase_project_id, &config.firebase_jwks_url, http_client)
    }

    pub fn issuer(&self) -> String {
        format!("{}{}", ISSUER_PREFIX, self.project_id)
    }

    pub async fn verify(&self, token: &str) -> Result<FirebaseClaims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::invalid_token(format!("malformed header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AuthError::invalid_token(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_token("missing key id"))?;

        let key = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let claims = decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::invalid_token(e.to_string()),
            })?
            .claims;

        if claims.sub.is_empty() || claims.sub.chars().count() > MAX_SUBJECT_LEN {
            return Err(AuthError::invalid_token("subject must be 1-128 characters"));
        }

        debug!("Verified ID token for subject {}", claims.sub);
        Ok(claims)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Instant::now() {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        // Expired cache or an unknown kid: the provider may have rotated keys.
        let fresh = self.fetch_keys().await?;
        let key = fresh.keys.get(kid).cloned();
        *self.cache.write().await = Some(fresh);

        key.ok_or_else(|| AuthError::invalid_token(format!("unknown key id {}", kid)))
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AuthError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::SigningKeysUnavailable { message: e.to_string() })?;

        if !response.status().is_success() {
            return Err(AuthError::SigningKeysUnavailable {
                message: format!("key endpoint returned {}", response.status()),
            });
        }

        let ttl = max_age(response.headers()).unwrap_or(DEFAULT_KEYS_TTL);
        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::SigningKeysUnavailable { message: e.to_string() })?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => warn!("Skipping unusable signing key {}: {}", kid, e),
            }
        }

        info!("Loaded {} identity signing key(s), valid for {}s", keys.len(), ttl.as_secs());
        Ok(CachedKeys {
            keys,
            expires_at: Instant::now() + ttl,
        })
    }
}

fn max_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// The authenticated caller, with a stored profile
pub struct AuthUser {
    pub profile: UserProfile,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token_from_headers(&parts.headers).ok_or(AuthError::MissingToken)?;
        let profile = authenticate(state, &token).await?;
        Ok(AuthUser { profile })
    }
}

/// Verifies `token` and returns the caller's profile, creating it on first login.
pub async fn authenticate(state: &AppState, token: &str) -> Result<UserProfile, AuthError> {
    let claims = state.verifier.verify(token).await?;
    let email = claims.email.unwrap_or_default();

    state
        .db
        .get_or_create_user_profile(&claims.sub, &email, claims.name.as_deref())
        .await
        .map_err(|e| AuthError::profile_store(e.to_string()))
}

pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = auth_str.split_once(' ')?;

    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sign_token, test_jwks, TEST_KEY_ID};
    use axum::http::HeaderValue;
    use serde_json::json;
    use wiremock::{matchers::{method, path}, Mock, MockServer, ResponseTemplate};

    const PROJECT: &str = "markezard-test";

    async fn verifier_with_keys() -> (FirebaseTokenVerifier, MockServer) {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "public, max-age=19204, must-revalidate")
                    .set_body_json(test_jwks()),
            )
            .mount(&mock_server)
            .await;

        let verifier = FirebaseTokenVerifier::new(
            PROJECT,
            format!("{}/jwks", mock_server.uri()),
            reqwest::Client::new(),
        );
        (verifier, mock_server)
    }

    fn claims(sub: &str) -> serde_json::Value {
        json!({
            "sub": sub,
            "aud": PROJECT,
            "iss": format!("{}{}", ISSUER_PREFIX, PROJECT),
            "exp": chrono::Utc::now().timestamp() + 3600,
            "iat": chrono::Utc::now().timestamp(),
            "email": "ada@example.com",
            "name": "Ada"
        })
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let (verifier, _server) = verifier_with_keys().await;
        let token = sign_token(&claims("user-1"), TEST_KEY_ID);

        let verified = verifier.verify(&token).await.unwrap();

        assert_eq!(verified.sub, "user-1");
        assert_eq!(verified.email.as_deref(), Some("ada@example.com"));
        assert_eq!(verified.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_keys_are_cached_between_verifications() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "max-age=600")
                    .set_body_json(test_jwks()),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let verifier = FirebaseTokenVerifier::new(
            PROJECT,
            format!("{}/jwks", mock_server.uri()),
            reqwest::Client::new(),
        );
        let token = sign_token(&claims("user-1"), TEST_KEY_ID);

        verifier.verify(&token).await.unwrap();
        verifier.verify(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_key_cache_is_refetched() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("cache-control", "public, max-age=0")
                    .set_body_json(test_jwks()),
            )
            .expect(2)
            .mount(&mock_server)
            .await;

        let verifier = FirebaseTokenVerifier::new(
            PROJECT,
            format!("{}/jwks", mock_server.uri()),
            reqwest::Client::new(),
        );
        let token = sign_token(&claims("user-1"), TEST_KEY_ID);

        verifier.verify(&token).await.unwrap();
        verifier.verify(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_audience_rejected() {
        let (verifier, _server) = verifier_with_keys().await;
        let mut payload = claims("user-1");
        payload["aud"] = json!("another-project");

        let err = verifier.verify(&sign_token(&payload, TEST_KEY_ID)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_wrong_issuer_rejected() {
        let (verifier, _server) = verifier_with_keys().await;
        let mut payload = claims("user-1");
        payload["iss"] = json!("https://accounts.example.com");

        let err = verifier.verify(&sign_token(&payload, TEST_KEY_ID)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (verifier, _server) = verifier_with_keys().await;
        let mut payload = claims("user-1");
        payload["exp"] = json!(chrono::Utc::now().timestamp() - 7200);

        let err = verifier.verify(&sign_token(&payload, TEST_KEY_ID)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn test_oversized_subject_rejected() {
        let (verifier, _server) = verifier_with_keys().await;
        let token = sign_token(&claims(&"u".repeat(129)), TEST_KEY_ID);

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_subject_limit_counts_characters() {
        let (verifier, _server) = verifier_with_keys().await;

        // 128 two-byte characters is 256 bytes but still within the limit.
        let wide = "é".repeat(128);
        let verified = verifier.verify(&sign_token(&claims(&wide), TEST_KEY_ID)).await.unwrap();
        assert_eq!(verified.sub, wide);

        let err = verifier
            .verify(&sign_token(&claims(&"é".repeat(129)), TEST_KEY_ID))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_unknown_key_id_rejected() {
        let (verifier, _server) = verifier_with_keys().await;
        let token = sign_token(&claims("user-1"), "rotated-away");

        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[tokio::test]
    async fn test_key_endpoint_down() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwks"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let verifier = FirebaseTokenVerifier::new(
            PROJECT,
            format!("{}/jwks", mock_server.uri()),
            reqwest::Client::new(),
        );
        let err = verifier
            .verify(&sign_token(&claims("user-1"), TEST_KEY_ID))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::SigningKeysUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (verifier, _server) = verifier_with_keys().await;
        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn test_extract_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert("authorization", HeaderValue::from_static("bearer abc"));
        assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("abc"));

        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_token_from_headers(&headers), None);
    }

    #[test]
    fn test_max_age_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=19204, must-revalidate"));
        assert_eq!(max_age(&headers), Some(Duration::from_secs(19204)));

        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        assert_eq!(max_age(&headers), None);
    }
}
