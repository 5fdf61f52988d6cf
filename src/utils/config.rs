// src/utils/config.rs
use std::time::Duration;

use crate::utils::error::AppError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
// Public pass-through proxy; the article URL is appended verbatim.
pub const DEFAULT_PROXY_URL: &str = "https://thingproxy.freeboard.io/fetch/";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_SIGN_IN_TIMEOUT: Duration = Duration::from_secs(180);

/// Runtime settings assembled from the environment and CLI overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub proxy_url: String,
    pub gemini_base_url: String,
    pub sheets_base_url: String,
    /// Pre-issued OAuth token; skips the browser sign-in when present.
    pub access_token: Option<String>,
    pub sign_in_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            proxy_url: DEFAULT_PROXY_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            sheets_base_url: DEFAULT_SHEETS_BASE_URL.to_string(),
            access_token: None,
            sign_in_timeout: DEFAULT_SIGN_IN_TIMEOUT,
        }
    }
}

impl Settings {
    /// Reads settings from process environment (after an optional `.env` load).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        settings.api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY"));
        if let Some(model) = non_empty("HOG_MODEL") {
            settings.model = model;
        }
        if let Some(raw) = non_empty("HOG_TEMPERATURE") {
            settings.temperature = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("HOG_TEMPERATURE must be a number, got '{}'", raw))
            })?;
        }
        if let Some(proxy) = non_empty("HOG_PROXY_URL") {
            settings.proxy_url = proxy;
        }
        if let Some(base) = non_empty("GEMINI_BASE_URL") {
            settings.gemini_base_url = base;
        }
        if let Some(base) = non_empty("SHEETS_BASE_URL") {
            settings.sheets_base_url = base;
        }
        settings.access_token = non_empty("GOOGLE_ACCESS_TOKEN");

        Ok(settings)
    }

    /// API key for the model endpoint, or a config error naming the variable.
    pub fn require_api_key(&self) -> Result<&str, AppError> {
        self.api_key.as_deref().ok_or_else(|| {
            AppError::Config("GEMINI_API_KEY (or API_KEY) environment variable not set".to_string())
        })
    }
}
