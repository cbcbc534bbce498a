#[cfg(test)]
mod tests {
    use crate::test_utils::TestContext;
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_integrate_website_rejects_bad_url() {
        let ctx = TestContext::new().await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx
            .post("/integrate-website", json!({"platform": "custom", "url": "shop.example.com"}), Some(&token))
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "WEBSITE_INVALID_URL");
    }

    #[tokio::test]
    async fn test_integrate_custom_website() {
        let ctx = TestContext::new().await;
        Mock::given(method("GET"))
            .and(path("/store"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head><title>Ridge Supply</title>
                   <meta name="description" content="Packs and poles"></head>
                   <body>
                     <script type="application/ld+json">
                       {"@type": "Product", "name": "Daypack 20L", "offers": {"price": "89.00"},
                        "image": "/img/daypack.jpg"}
                     </script>
                   </body></html>"#,
            ))
            .mount(&ctx.server)
            .await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx
            .post(
                "/integrate-website",
                json!({"platform": "custom", "url": format!("{}/store", ctx.server.uri())}),
                Some(&token),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["site_meta"]["title"], "Ridge Supply");
        assert_eq!(body["products"][0]["name"], "Daypack 20L");
        assert_eq!(body["products"][0]["price"], 89.0);
        assert_eq!(
            body["sample_images"][0],
            format!("{}/img/daypack.jpg", ctx.server.uri())
        );
    }

    #[tokio::test]
    async fn test_integrate_unreachable_website_is_empty() {
        let ctx = TestContext::new().await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx
            .post(
                "/integrate-website",
                json!({"platform": "wordpress", "url": format!("{}/missing", ctx.server.uri())}),
                Some(&token),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["site_meta"]["title"], "Unknown Site");
        assert!(body["products"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyse_website() {
        let ctx = TestContext::new().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Ridge Supply"))
            .respond_with(ResponseTemplate::new(200).set_body_json(crate::test_utils::gemini_reply(
                r#"{"strengths": ["Focused range"], "weaknesses": ["Few reviews"],
                    "improvement_suggestions": ["Add bundles"], "product_positioning": "Premium day hiking"}"#,
            )))
            .mount(&ctx.server)
            .await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx
            .post(
                "/analyse-website",
                json!({"site_data": {"site_meta": {"title": "Ridge Supply"}, "products": []}}),
                Some(&token),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strengths"], json!(["Focused range"]));
        assert_eq!(body["product_positioning"], "Premium day hiking");
    }

    #[tokio::test]
    async fn test_analyse_website_fallback() {
        let ctx = TestContext::new().await;
        ctx.mock_llm_reply("I could not analyse that site.").await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx
            .post("/analyse-website", json!({"site_data": {}}), Some(&token))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strengths"][0], "Professional website design");
    }

    #[tokio::test]
    async fn test_analyse_website_llm_down() {
        let ctx = TestContext::new().await;
        ctx.mock_llm_failure(503).await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx
            .post("/analyse-website", json!({"site_data": {}}), Some(&token))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "WEBSITE_ANALYSIS_FAILED");
    }

    #[tokio::test]
    async fn test_platform_suggestions() {
        let ctx = TestContext::new().await;
        Mock::given(method("POST"))
            .and(body_string_contains("handmade jewelry"))
            .respond_with(ResponseTemplate::new(200).set_body_json(crate::test_utils::gemini_reply(
                r#"{"suggestions": [{"platform": "TikTok", "score": 92, "rationale": "Visual discovery",
                    "estimated_reach": 3000000, "cost_effectiveness": "high"}]}"#,
            )))
            .mount(&ctx.server)
            .await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx
            .get("/platform-suggestions?product_type=handmade%20jewelry", Some(&token))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"][0]["platform"], "TikTok");
        assert_eq!(body["suggestions"][0]["score"], 92.0);
    }

    #[tokio::test]
    async fn test_platform_suggestions_fallback() {
        let ctx = TestContext::new().await;
        ctx.mock_llm_reply("{\"note\": \"no idea\"}").await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx.get("/platform-suggestions", Some(&token)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
        assert_eq!(body["suggestions"][0]["platform"], "Meta");
    }

    #[tokio::test]
    async fn test_platform_suggestions_malformed() {
        let ctx = TestContext::new().await;
        ctx.mock_llm_reply(r#"{"suggestions": [{"platform": "Meta"}]}"#).await;
        let token = ctx.token_for("merchant");

        let (status, body) = ctx.get("/platform-suggestions", Some(&token)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "WEBSITE_SUGGESTIONS_FAILED");
    }
}
