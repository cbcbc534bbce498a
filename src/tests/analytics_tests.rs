#[cfg(test)]
mod tests {
    use crate::test_utils::{TestContext, TEST_META_ACCOUNT};
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_meta_analytics_are_live() {
        let ctx = TestContext::new().await;
        Mock::given(method("GET"))
            .and(path("/meta/cmp-77/insights"))
            .and(query_param("date_preset", "last_7_days"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{
                    "impressions": "12000", "clicks": "300", "spend": "150.50",
                    "ctr": "2.5", "cpc": "0.5", "conversions": "6"
                }]
            })))
            .mount(&ctx.server)
            .await;
        let token = ctx.token_for("analyst");

        let (status, body) = ctx
            .get("/campaign-analytics?campaign_id=cmp-77&platform=meta", Some(&token))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data_source"], "live");
        assert_eq!(body["platform"], "meta");
        assert_eq!(body["metrics"]["impressions"], 12000);
        assert_eq!(body["metrics"]["spend"], 150.5);
    }

    #[tokio::test]
    async fn test_meta_analytics_failure_is_500() {
        let ctx = TestContext::new().await;
        Mock::given(method("GET"))
            .and(path("/meta/cmp-77/insights"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": {"message": "Unknown campaign"}})))
            .mount(&ctx.server)
            .await;
        let token = ctx.token_for("analyst");

        let (status, body) = ctx
            .get("/campaign-analytics?campaign_id=cmp-77&platform=meta", Some(&token))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "ANALYTICS_RETRIEVAL_FAILED");
    }

    #[tokio::test]
    async fn test_other_platforms_get_mock_metrics() {
        let ctx = TestContext::new().await;
        let token = ctx.token_for("analyst");

        let (status, body) = ctx
            .get("/campaign-analytics?campaign_id=g-1&platform=google", Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data_source"], "mock");
        assert_eq!(body["metrics"]["impressions"], 8500);

        let (status, body) = ctx
            .get("/campaign-analytics?campaign_id=p-1&platform=pinterest", Some(&token))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["platform"], "pinterest");
        assert_eq!(body["data_source"], "mock");
    }

    #[tokio::test]
    async fn test_audit_logs_list_callers_entries() {
        let ctx = TestContext::new().await;
        let token = ctx.token_for("auditor");
        // Profile row first, as a real request would create it.
        ctx.get("/auth/me", Some(&token)).await;

        ctx.state
            .db
            .log_audit_event("auditor", "campaign_publish_attempt", &json!({"platform": "meta", "account": TEST_META_ACCOUNT}))
            .await
            .unwrap();
        ctx.state
            .db
            .log_audit_event("someone-else", "campaign_publish_attempt", &json!({}))
            .await
            .unwrap();

        let (status, body) = ctx.get("/audit-logs?limit=10", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["event_type"], "campaign_publish_attempt");
        assert_eq!(entries[0]["details"]["platform"], "meta");
    }

    #[tokio::test]
    async fn test_analytics_require_auth() {
        let ctx = TestContext::new().await;

        let (status, _) = ctx.get("/audit-logs", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = ctx.get("/campaign-analytics?campaign_id=x&platform=meta", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
