use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::models::AuditLogEntry;
use super::{format_timestamp, parse_timestamp, Database};

impl Database {
    /// Appends an audit event and returns its id. The IP address is lifted
    /// out of `details.ip_address` when present.
    pub async fn log_audit_event(
        &self,
        user_id: &str,
        event_type: &str,
        details: &serde_json::Value,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let ip_address = details
            .get("ip_address")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, user_id, event_type, details, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#
        )
        .bind(&id)
        .bind(user_id)
        .bind(event_type)
        .bind(serde_json::to_string(details)?)
        .bind(ip_address)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        info!("Audit event logged: {} for user {}", event_type, user_id);
        Ok(id)
    }

    pub async fn list_audit_events(&self, user_id: &str, limit: i64) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, event_type, details, ip_address, created_at
            FROM audit_logs
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let details: String = row.try_get("details")?;
                let created_at: String = row.try_get("created_at")?;
                Ok(AuditLogEntry {
                    id: row.try_get("id")?,
                    user_id: row.try_get("user_id")?,
                    event_type: row.try_get("event_type")?,
                    details: serde_json::from_str(&details)?,
                    ip_address: row.try_get("ip_address")?,
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .collect()
    }
}
