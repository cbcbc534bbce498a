use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use tracing::info;

use crate::models::{UserProfile, DEFAULT_PLAN};
use super::{format_timestamp, parse_timestamp, Database};

impl Database {
    pub async fn get_user_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            "SELECT uid, email, name, plan, created_at FROM users WHERE uid = $1"
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let created_at: String = row.try_get("created_at")?;
                Ok(Some(UserProfile {
                    uid: row.try_get("uid")?,
                    email: row.try_get("email")?,
                    name: row.try_get("name")?,
                    plan: row.try_get("plan")?,
                    created_at: Some(parse_timestamp(&created_at)?),
                }))
            }
            None => Ok(None),
        }
    }

    /// Returns the stored profile for `uid`, creating it on first sight.
    ///
    /// Email and name always come from the verified token; plan and creation
    /// time come from the store. Each call records the login time.
    pub async fn get_or_create_user_profile(
        &self,
        uid: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<UserProfile> {
        let now = format_timestamp(Utc::now());

        if self.get_user_profile(uid).await?.is_none() {
            sqlx::query(
                r#"
                INSERT INTO users (uid, email, name, plan, campaigns_created, created_at, last_login)
                VALUES ($1, $2, $3, $4, 0, $5, $6)
                ON CONFLICT (uid) DO NOTHING
                "#
            )
            .bind(uid)
            .bind(email)
            .bind(name.map(str::to_string))
            .bind(DEFAULT_PLAN)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await?;
            info!("Created new user profile for: {}", email);
        } else {
            sqlx::query("UPDATE users SET last_login = $1 WHERE uid = $2")
                .bind(&now)
                .bind(uid)
                .execute(&self.pool)
                .await?;
        }

        let stored = self
            .get_user_profile(uid)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User profile {} vanished after upsert", uid))?;

        Ok(UserProfile {
            uid: stored.uid,
            email: email.to_string(),
            name: name.map(str::to_string),
            plan: stored.plan,
            created_at: stored.created_at,
        })
    }

    pub async fn increment_campaigns_created(&self, uid: &str) -> Result<()> {
        sqlx::query("UPDATE users SET campaigns_created = campaigns_created + 1 WHERE uid = $1")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_campaigns_created(&self, uid: &str) -> Result<i64> {
        let row = sqlx::query("SELECT campaigns_created FROM users WHERE uid = $1")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(row.try_get("campaigns_created")?),
            None => Ok(0),
        }
    }
}
