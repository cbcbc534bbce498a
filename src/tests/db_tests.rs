#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::{
        AdPlatform, AdVariation, CampaignDraft, CampaignGoal, DraftBudget, UntappedInterest,
    };
    use serde_json::json;
    use std::time::Duration;

    async fn test_db() -> Database {
        let db = Database::new_in_memory().await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn sample_draft() -> CampaignDraft {
        CampaignDraft {
            primary_copy: AdVariation {
                headline: "Brew better".to_string(),
                description: "Single-origin beans roasted weekly".to_string(),
                cta: "Shop Now".to_string(),
            },
            variations: vec![],
            creative_instructions: "Morning light, steam".to_string(),
            untapped_interests: vec![UntappedInterest {
                interest: "pour-over enthusiasts".to_string(),
                success_score: 82,
                competition: "low".to_string(),
                reasoning: "Niche but engaged".to_string(),
            }],
            targeting_suggestions: json!({"demographics": {"age_range": "25-44"}}),
            name: Some("Beans - Meta Campaign".to_string()),
            platform: Some(AdPlatform::Meta),
            goal: Some(CampaignGoal::Conversions),
            budget: Some(DraftBudget { daily_budget: 40.0 }),
        }
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = test_db().await;
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_user_profile_created_once() {
        let db = test_db().await;

        let first = db
            .get_or_create_user_profile("uid-1", "ada@example.com", Some("Ada"))
            .await
            .unwrap();
        assert_eq!(first.plan, "free");
        assert_eq!(first.name.as_deref(), Some("Ada"));
        assert!(first.created_at.is_some());

        // Token claims win for email and name, the store keeps plan and creation time.
        let second = db
            .get_or_create_user_profile("uid-1", "ada@new.example.com", None)
            .await
            .unwrap();
        assert_eq!(second.email, "ada@new.example.com");
        assert_eq!(second.name, None);
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let db = test_db().await;
        assert!(db.get_user_profile("nobody").await.unwrap().is_none());
        assert_eq!(db.get_campaigns_created("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_campaign_counter() {
        let db = test_db().await;
        db.get_or_create_user_profile("uid-1", "ada@example.com", None).await.unwrap();

        db.increment_campaigns_created("uid-1").await.unwrap();
        db.increment_campaigns_created("uid-1").await.unwrap();

        assert_eq!(db.get_campaigns_created("uid-1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_audit_events_newest_first() {
        let db = test_db().await;

        let first = db
            .log_audit_event("uid-1", "campaign_publish_attempt", &json!({"ip_address": "10.0.0.7"}))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = db
            .log_audit_event("uid-1", "campaign_publish_result", &json!({"result": "dry_run_success"}))
            .await
            .unwrap();
        db.log_audit_event("uid-2", "campaign_publish_attempt", &json!({})).await.unwrap();

        let entries = db.list_audit_events("uid-1", 10).await.unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, second);
        assert_eq!(entries[0].ip_address, "unknown");
        assert_eq!(entries[0].details["result"], "dry_run_success");
        assert_eq!(entries[1].id, first);
        assert_eq!(entries[1].ip_address, "10.0.0.7");

        let limited = db.list_audit_events("uid-1", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_campaign_draft_round_trip_and_ownership() {
        let db = test_db().await;
        let draft = sample_draft();

        let record = db
            .create_campaign_draft("uid-1", "Beans - Meta Campaign", AdPlatform::Meta, CampaignGoal::Conversions, &draft)
            .await
            .unwrap();

        let fetched = db.get_campaign_draft("uid-1", &record.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Beans - Meta Campaign");
        assert_eq!(fetched.platform, AdPlatform::Meta);
        assert_eq!(fetched.goal, CampaignGoal::Conversions);
        assert_eq!(fetched.draft, draft);

        assert!(db.get_campaign_draft("uid-2", &record.id).await.unwrap().is_none());
        assert!(db.get_campaign_draft("uid-1", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_campaign_drafts() {
        let db = test_db().await;
        let draft = sample_draft();

        let older = db
            .create_campaign_draft("uid-1", "First", AdPlatform::Google, CampaignGoal::Traffic, &draft)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newer = db
            .create_campaign_draft("uid-1", "Second", AdPlatform::Meta, CampaignGoal::Leads, &draft)
            .await
            .unwrap();
        db.create_campaign_draft("uid-2", "Other", AdPlatform::X, CampaignGoal::Awareness, &draft)
            .await
            .unwrap();

        let drafts = db.list_campaign_drafts("uid-1", 50).await.unwrap();
        let ids: Vec<&str> = drafts.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
    }
}
