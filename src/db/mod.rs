use anyhow::{anyhow, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{any::AnyPoolOptions, AnyPool};
use std::time::Duration;
use tracing::info;

pub mod users;
pub mod audit;
pub mod campaigns;

/// Handle to the document store. Works against PostgreSQL or SQLite through
/// sqlx's `Any` driver, so every column is a portable type and timestamps are
/// stored as RFC 3339 text.
#[derive(Clone)]
pub struct Database {
    pub pool: AnyPool,
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        uid TEXT PRIMARY KEY,
        email TEXT NOT NULL,
        name TEXT,
        plan TEXT NOT NULL DEFAULT 'free',
        campaigns_created BIGINT NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        last_login TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        details TEXT NOT NULL,
        ip_address TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_user ON audit_logs (user_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS campaign_drafts (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        platform TEXT NOT NULL,
        goal TEXT NOT NULL,
        name TEXT NOT NULL,
        draft TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_campaign_drafts_user ON campaign_drafts (user_id, created_at)",
];

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))       // 10 minute idle timeout
            .max_lifetime(Duration::from_secs(1800))      // 30 minute max lifetime
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory SQLite database. A single connection that never
    /// expires, since every new connection would see an empty database.
    pub async fn new_in_memory() -> Result<Self> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    // Fixed precision keeps lexical order equal to chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("Invalid stored timestamp '{}': {}", raw, e))
}
