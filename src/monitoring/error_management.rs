use tracing::{debug, info, warn, error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Error classification system for log routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Errors that break a request outright
    Critical,
    /// Errors that affect one feature or vendor integration
    Important,
    /// Minor issues, logged for debugging
    Minor,
    /// Expected errors in normal operation (bad input, expired tokens)
    Expected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Token verification and user profiles
    Auth,
    /// LLM provider calls and response parsing
    AiService,
    /// Ads platform calls
    AdsPlatform,
    /// Website scraping and e-commerce platform APIs
    Scraping,
    /// Profile, draft and audit storage
    Database,
    /// Request payload validation
    Validation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub user_message: String,
    pub technical_details: String,
    pub suggested_action: Option<String>,
    pub suppression_key: Option<String>, // For suppressing repeated errors
}

/// Entries idle for longer than this are dropped.
const SUPPRESSION_WINDOW_MINUTES: i64 = 10;
const MAX_SUPPRESSION_KEYS: usize = 1024;

/// Logs errors by severity and damps repeated ones
pub struct ErrorManager {
    error_suppressions: Arc<RwLock<HashMap<String, ErrorSuppressionState>>>,
}

#[derive(Debug, Clone)]
struct ErrorSuppressionState {
    count: usize,
    last_occurrence: chrono::DateTime<chrono::Utc>,
}

impl Default for ErrorManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorManager {
    pub fn new() -> Self {
        Self {
            error_suppressions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Handle an error with severity-based logging and suppression
    pub async fn handle_error(&self, error: ManagedError) {
        if let Some(suppression_key) = &error.suppression_key {
            if self.should_suppress_error(suppression_key).await {
                debug!(
                    category = ?error.category,
                    code = error.code,
                    "Suppressed repeated error: {}", error.technical_details
                );
                return;
            }
            self.record_error_occurrence(suppression_key).await;
        }

        match error.severity {
            ErrorSeverity::Critical => {
                error!(
                    category = ?error.category,
                    code = error.code,
                    user_message = error.user_message,
                    "Critical error: {}",
                    error.technical_details
                );
            }
            ErrorSeverity::Important => {
                warn!(
                    category = ?error.category,
                    code = error.code,
                    "Important error: {} | User: {}",
                    error.technical_details,
                    error.user_message
                );
            }
            ErrorSeverity::Minor => {
                info!(
                    category = ?error.category,
                    code = error.code,
                    "Minor issue: {}",
                    error.technical_details
                );
            }
            ErrorSeverity::Expected => {
                debug!(
                    category = ?error.category,
                    code = error.code,
                    "Expected error: {}",
                    error.technical_details
                );
            }
        }
    }

    /// Suppress once a key has been seen more than 3 times in the last 5 minutes
    async fn should_suppress_error(&self, suppression_key: &str) -> bool {
        let suppressions = self.error_suppressions.read().await;
        if let Some(state) = suppressions.get(suppression_key) {
            if state.count > 3 {
                let five_minutes_ago = chrono::Utc::now() - chrono::Duration::minutes(5);
                return state.last_occurrence > five_minutes_ago;
            }
        }
        false
    }

    async fn record_error_occurrence(&self, suppression_key: &str) {
        let mut suppressions = self.error_suppressions.write().await;
        let now = chrono::Utc::now();
        let stale_before = now - chrono::Duration::minutes(SUPPRESSION_WINDOW_MINUTES);

        // Stale entries can no longer suppress anything.
        suppressions.retain(|_, state| state.last_occurrence >= stale_before);

        if !suppressions.contains_key(suppression_key) && suppressions.len() >= MAX_SUPPRESSION_KEYS {
            let oldest = suppressions
                .iter()
                .min_by_key(|(_, state)| state.last_occurrence)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                suppressions.remove(&oldest);
            }
        }

        let state = suppressions
            .entry(suppression_key.to_string())
            .or_insert(ErrorSuppressionState {
                count: 0,
                last_occurrence: now,
            });

        state.count += 1;
        state.last_occurrence = now;
    }
}

/// Managed errors raised from inside vendor clients, outside any HTTP response
pub struct VendorErrorHandler;

impl VendorErrorHandler {
    /// An LLM key hit its quota or rate limit and was taken out of rotation
    pub fn llm_key_exhausted(key_number: usize, technical_error: &str) -> ManagedError {
        ManagedError {
            category: ErrorCategory::AiService,
            severity: ErrorSeverity::Important,
            code: "LLM_KEY_EXHAUSTED".to_string(),
            user_message: "AI service capacity is temporarily reduced".to_string(),
            technical_details: format!(
                "Gemini API key {} hit quota or rate limit: {}",
                key_number, technical_error
            ),
            suggested_action: Some("Add more API keys or raise the quota".to_string()),
            suppression_key: Some(format!("llm_key_exhausted_{}", key_number)),
        }
    }

    /// A website could not be fetched or parsed during integration
    pub fn scrape_failed(url: &str, technical_error: &str) -> ManagedError {
        ManagedError {
            category: ErrorCategory::Scraping,
            severity: ErrorSeverity::Minor,
            code: "WEBSITE_SCRAPE_FAILED".to_string(),
            user_message: "Some website data could not be read".to_string(),
            technical_details: format!("Scraping {} failed: {}", url, technical_error),
            suggested_action: Some("Check that the site is publicly reachable".to_string()),
            suppression_key: Some(format!("scrape_failed_{}", scrape_target(url))),
        }
    }
}

/// Scrape failures are grouped per host so arbitrary URLs share one key.
fn scrape_target(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "invalid_url".to_string())
}

static ERROR_MANAGER: std::sync::OnceLock<ErrorManager> = std::sync::OnceLock::new();

pub fn get_error_manager() -> &'static ErrorManager {
    ERROR_MANAGER.get_or_init(ErrorManager::new)
}
