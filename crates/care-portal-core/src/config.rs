//! Portal configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! `{}`) is valid. A few environment variables override the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::patient_id::CountryCodes;

/// Environment variable overriding `database_path`.
pub const ENV_DATABASE_PATH: &str = "CARE_PORTAL_DB";
/// Environment variable overriding `ml.api_url`.
pub const ENV_ML_API_URL: &str = "ML_API_URL";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid country code {code:?} for {country:?}: expected two ASCII letters")]
    InvalidCountryCode { country: String, code: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Extra country name → code entries on top of the built-in table
    pub country_codes: HashMap<String, String>,
    pub ml: MlConfig,
    pub gemini: GeminiConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("care-portal.db"),
            country_codes: HashMap::new(),
            ml: MlConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Local prediction service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlConfig {
    pub api_url: String,
    /// Health probes before giving up on readiness
    pub health_retries: u32,
    pub health_retry_delay_ms: u64,
    pub health_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            health_retries: 10,
            health_retry_delay_ms: 1_000,
            health_timeout_ms: 2_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// Generative text endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    /// Base URL; the model name and `:generateContent` are appended
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub request_timeout_ms: u64,
    /// Readings of each kind included in a prompt
    pub history_limit: usize,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_ms: 60_000,
            history_limit: 500,
        }
    }
}

impl GeminiConfig {
    /// Full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl PortalConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: PortalConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `CARE_PORTAL_DB` and `ML_API_URL` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_ML_API_URL).filter(|v| !v.is_empty()) {
            self.ml.api_url = url;
        }
        self
    }

    /// Check the country code table.
    pub fn validate(&self) -> ConfigResult<()> {
        for (country, code) in &self.country_codes {
            if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
                return Err(ConfigError::InvalidCountryCode {
                    country: country.clone(),
                    code: code.clone(),
                });
            }
        }
        Ok(())
    }

    /// Built-in country table extended with the configured entries.
    pub fn country_table(&self) -> CountryCodes {
        CountryCodes::builtin().with_overrides(self.country_codes.clone())
    }
}
