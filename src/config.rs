use std::env;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub const APP_TITLE: &str = "FarmAssist - For Nigerian Farmers";
pub const APP_TAGLINE: &str = "Your Go-To Assistant for Farm Matters in Nigeria";
pub const ASSISTANT_NAME: &str = "FarmAssist";

/// Region used when the farmer leaves the region field blank.
pub const DEFAULT_REGION: &str = "Nigeria";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const API_KEY_VAR: &str = "GEMINI_API_KEY";
const MODEL_VAR: &str = "GEMINI_MODEL";
const API_BASE_VAR: &str = "GEMINI_API_BASE";
const TIMEOUT_VAR: &str = "GEMINI_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Gemini API key not found. Please set your GEMINI_API_KEY in the .env file.")]
    MissingApiKey,
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl GenerationConfig {
    pub const DEFAULT: GenerationConfig = GenerationConfig {
        temperature: 0.7,
        top_p: 0.8,
        top_k: 40,
        max_output_tokens: 1000,
    };
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;

        let model = get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base = get(API_BASE_VAR)
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let timeout_secs = match get(TIMEOUT_VAR) {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: TIMEOUT_VAR,
                value: raw,
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model,
            api_base,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
