use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::{any::AnyRow, Row};
use uuid::Uuid;

use crate::models::{AdPlatform, CampaignDraft, CampaignDraftRecord, CampaignGoal};
use super::{format_timestamp, parse_timestamp, Database};

impl Database {
    pub async fn create_campaign_draft(
        &self,
        user_id: &str,
        name: &str,
        platform: AdPlatform,
        goal: CampaignGoal,
        draft: &CampaignDraft,
    ) -> Result<CampaignDraftRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO campaign_drafts (id, user_id, platform, goal, name, draft, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#
        )
        .bind(&id)
        .bind(user_id)
        .bind(platform.as_str())
        .bind(goal.as_str())
        .bind(name)
        .bind(serde_json::to_string(draft)?)
        .bind(format_timestamp(now))
        .execute(&self.pool)
        .await?;

        Ok(CampaignDraftRecord {
            id,
            user_id: user_id.to_string(),
            platform,
            goal,
            name: name.to_string(),
            draft: draft.clone(),
            created_at: now,
        })
    }

    pub async fn list_campaign_drafts(&self, user_id: &str, limit: i64) -> Result<Vec<CampaignDraftRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, platform, goal, name, draft, created_at
            FROM campaign_drafts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(draft_from_row).collect()
    }

    /// Only returns drafts owned by `user_id`.
    pub async fn get_campaign_draft(&self, user_id: &str, id: &str) -> Result<Option<CampaignDraftRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, platform, goal, name, draft, created_at
            FROM campaign_drafts
            WHERE id = $1 AND user_id = $2
            "#
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(draft_from_row).transpose()
    }
}

fn draft_from_row(row: &AnyRow) -> Result<CampaignDraftRecord> {
    let platform: String = row.try_get("platform")?;
    let goal: String = row.try_get("goal")?;
    let draft: String = row.try_get("draft")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(CampaignDraftRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        platform: AdPlatform::parse(&platform)
            .ok_or_else(|| anyhow!("Unknown stored platform '{}'", platform))?,
        goal: serde_json::from_value(serde_json::Value::String(goal))?,
        name: row.try_get("name")?,
        draft: serde_json::from_str(&draft)?,
        created_at: parse_timestamp(&created_at)?,
    })
}
