//! Gemini `generateContent` client with API-key rotation.
//!
//! Up to four keys are used round-robin. A key that hits its quota is taken
//! out of rotation until every key has failed, at which point the whole ring
//! is reset. Other failures are retried with exponential backoff.

use axum::http::StatusCode;
use rand::Rng;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::{impl_into_response, AppError};
use crate::monitoring::error_management::{
    get_error_manager, ErrorCategory, ErrorSeverity, VendorErrorHandler,
};

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const RAW_RESPONSE_PREVIEW: usize = 500;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Empty response from Gemini")]
    EmptyResponse,
    #[error("No Gemini API keys configured")]
    NoKeys,
    #[error("Gemini AI service failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl LlmError {
    /// Quota and rate-limit failures rotate to the next key instead of backing off.
    pub fn is_quota_error(&self) -> bool {
        if let LlmError::ApiError { status: 429, .. } = self {
            return true;
        }
        let message = self.to_string().to_lowercase();
        message.contains("quota") || message.contains("rate limit") || message.contains("429")
    }
}

impl AppError for LlmError {
    fn status_code(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    fn user_message(&self) -> String {
        "AI service temporarily unavailable".to_string()
    }

    fn error_code(&self) -> &'static str {
        match self {
            LlmError::NoKeys => "LLM_NOT_CONFIGURED",
            LlmError::Exhausted { .. } => "LLM_RETRIES_EXHAUSTED",
            _ => "LLM_REQUEST_FAILED",
        }
    }

    fn error_category(&self) -> ErrorCategory {
        ErrorCategory::AiService
    }

    fn error_severity(&self) -> ErrorSeverity {
        match self {
            LlmError::NoKeys => ErrorSeverity::Critical,
            _ => ErrorSeverity::Important,
        }
    }

    fn suppression_key(&self) -> Option<String> {
        Some(format!("llm_{}", self.error_code().to_lowercase()))
    }
}

impl_into_response!(LlmError);

/// Sampling parameters for one call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: 2048,
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
        }
    }
}

impl GenerationSettings {
    pub fn new(temperature: f64, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct KeyRingState {
    current: usize,
    failed: HashSet<usize>,
    usage: HashMap<usize, u64>,
}

/// Round-robin rotation over API keys that have not hit their quota
#[derive(Debug)]
pub struct KeyRing {
    keys: Vec<String>,
    state: Mutex<KeyRingState>,
}

impl KeyRing {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            state: Mutex::new(KeyRingState::default()),
        }
    }

    /// Returns the index and value of the next usable key.
    pub fn next_key(&self) -> Option<(usize, String)> {
        if self.keys.is_empty() {
            return None;
        }
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let mut available: Vec<usize> = (0..self.keys.len())
            .filter(|i| !state.failed.contains(i))
            .collect();
        if available.is_empty() {
            warn!("All Gemini API keys failed, resetting failed keys list");
            state.failed.clear();
            available = (0..self.keys.len()).collect();
        }

        let selected = available[state.current % available.len()];
        state.current = (state.current + 1) % available.len();
        let usage = state.usage.entry(selected).or_insert(0);
        *usage += 1;

        info!("Using Gemini API key {} (usage: {})", selected + 1, usage);
        Some((selected, self.keys[selected].clone()))
    }

    pub fn mark_failed(&self, index: usize) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.failed.insert(index);
        warn!("Marked Gemini API key {} as failed", index + 1);
    }

    pub fn usage(&self, index: usize) -> u64 {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.usage.get(&index).copied().unwrap_or(0)
    }
}

pub struct GeminiClient {
    base_url: String,
    model: String,
    keys: KeyRing,
    client: reqwest::Client,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        keys: Vec<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            keys: KeyRing::new(keys),
            client,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        Self::new(
            &config.gemini_base_url,
            &config.gemini_model,
            config.gemini_api_keys.clone(),
            client,
        )
        .with_retries(config.gemini_max_retries, config.gemini_backoff_base_ms)
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries.max(1);
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    pub fn key_ring(&self) -> &KeyRing {
        &self.keys
    }

    /// Sends `prompt` and returns the model's text, rotating keys and
    /// retrying as needed.
    pub async fn generate(&self, prompt: &str, settings: GenerationSettings) -> Result<String, LlmError> {
        let attempts = self.max_retries;
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..attempts {
            let (index, key) = self.keys.next_key().ok_or(LlmError::NoKeys)?;

            match self.call_once(&key, prompt, &settings).await {
                Ok(text) => {
                    info!("Gemini response generated successfully");
                    return Ok(text);
                }
                Err(e) if e.is_quota_error() => {
                    self.keys.mark_failed(index);
                    warn!("Quota/rate limit hit for key {}, trying next key: {}", index + 1, e);
                    get_error_manager()
                        .handle_error(VendorErrorHandler::llm_key_exhausted(index + 1, &e.to_string()))
                        .await;
                    last_error = Some(e);
                }
                Err(e) => {
                    if attempt + 1 < attempts {
                        let wait = self.backoff(attempt);
                        warn!(
                            "Gemini API error (attempt {}), retrying in {}ms: {}",
                            attempt + 1,
                            wait.as_millis(),
                            e
                        );
                        tokio::time::sleep(wait).await;
                    } else {
                        error!("Gemini API call failed: {}", e);
                    }
                    last_error = Some(e);
                }
            }
        }

        let last_error = last_error.map(|e| e.to_string()).unwrap_or_default();
        error!("All Gemini API attempts failed. Last error: {}", last_error);
        Err(LlmError::Exhausted { attempts, last_error })
    }

    /// Like [`generate`](Self::generate) but parses the reply as a JSON object.
    pub async fn generate_structured(&self, prompt: &str, settings: GenerationSettings) -> Result<Value, LlmError> {
        let text = self.generate(prompt, settings).await?;
        Ok(parse_structured_output(&text))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.backoff_base_ms.saturating_mul(1u64 << attempt.min(16));
        let jitter = rand::thread_rng().gen_range(0..=self.backoff_base_ms);
        Duration::from_millis(base + jitter)
    }

    async fn call_once(&self, key: &str, prompt: &str, settings: &GenerationSettings) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let safety_settings: Vec<Value> = HARM_CATEGORIES
            .iter()
            .map(|category| json!({"category": category, "threshold": "BLOCK_MEDIUM_AND_ABOVE"}))
            .collect();

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": settings.max_output_tokens,
                "temperature":     settings.temperature,
                "topP":            settings.top_p,
                "topK":            settings.top_k,
            },
            "safetySettings": safety_settings,
        });

        let resp = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;
        let json = check_response_status(resp).await?;

        let text = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

async fn check_response_status(resp: reqwest::Response) -> Result<Value, LlmError> {
    let status = resp.status().as_u16();
    let raw = resp.text().await?;
    if status >= 400 {
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        let message = body["error"]["message"]
            .as_str()
            .or_else(|| body["message"].as_str())
            .map(str::to_string)
            .unwrap_or_else(|| raw.chars().take(200).collect());
        return Err(LlmError::ApiError { status, message });
    }
    Ok(serde_json::from_str(&raw)?)
}

/// Extracts a JSON object from model output that may be wrapped in markdown
/// fences or prose. Unparseable output becomes an object with an `error` key.
pub fn parse_structured_output(response: &str) -> Value {
    let mut text = response.trim();
    text = text.strip_prefix("```json").unwrap_or(text);
    text = text.strip_prefix("```").unwrap_or(text);
    text = text.strip_suffix("```").unwrap_or(text);

    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    };

    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(value) => value,
        Err(e) => {
            let preview: String = text.chars().take(RAW_RESPONSE_PREVIEW).collect();
            error!("Failed to parse structured output: {}", e);
            error!("Response was: {}...", preview);
            json!({
                "error": "Failed to parse structured output",
                "raw_response": preview,
            })
        }
    }
}
