#[cfg(test)]
mod tests {
    use crate::test_utils::{id_token_claims, sign_token, TestContext, TEST_KEY_ID};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_verify_token_returns_profile() {
        let ctx = TestContext::new().await;
        let token = ctx.token_for("user-42");

        let (status, body) = ctx.post("/auth/verify-token", json!({"token": token}), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], true);
        assert_eq!(body["user"]["uid"], "user-42");
        assert_eq!(body["user"]["email"], "user-42@example.com");
        assert_eq!(body["user"]["plan"], "free");

        let stored = ctx.state.db.get_user_profile("user-42").await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_verify_token_rejects_bad_token() {
        let ctx = TestContext::new().await;

        let (status, body) = ctx.post("/auth/verify-token", json!({"token": "garbage"}), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid authentication token");
        assert_eq!(body["status"], 401);
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let ctx = TestContext::new().await;

        let (status, _) = ctx.get("/auth/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_returns_caller() {
        let ctx = TestContext::new().await;
        let token = ctx.token_for("user-7");

        let (status, body) = ctx.get("/auth/me", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uid"], "user-7");
        assert_eq!(body["name"], "Test User");
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let ctx = TestContext::new().await;
        let mut claims = id_token_claims("user-7", "user-7@example.com");
        claims["exp"] = json!(chrono::Utc::now().timestamp() - 7200);
        let token = sign_token(&claims, TEST_KEY_ID);

        let (status, _) = ctx.get("/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let ctx = TestContext::new().await;

        let (status, health) = ctx.get("/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

        let (status, root) = ctx.get("/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(root["docs"], "/docs");
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let ctx = TestContext::new().await;

        let (status, doc) = ctx.get("/openapi.json", None).await;

        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/generate-campaign"].is_object());
    }
}
