// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! External API keys are optional. When a key is missing the matching
//! adapter runs in its offline fallback mode.

use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Path of the JSON document holding every account
    pub data_file: PathBuf,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// OpenAI key for workout photo verification
    pub openai_api_key: Option<String>,
    /// OpenWeatherMap key
    pub openweather_api_key: Option<String>,
    /// USDA FoodData Central key
    pub usda_api_key: Option<String>,

    // --- Upstream endpoints (overridable for tests) ---
    pub openai_base_url: String,
    pub openweather_base_url: String,
    pub usda_base_url: String,
}

pub const DEFAULT_DATA_FILE: &str = "fittrack_users.json";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENWEATHER_BASE_URL: &str = "http://api.openweathermap.org";
pub const USDA_BASE_URL: &str = "https://api.nal.usda.gov";

impl Config {
    /// Config for tests: no external keys, data file under the temp dir.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            data_file: env::temp_dir().join("fittrack_test_users.json"),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            openai_api_key: None,
            openweather_api_key: None,
            usda_api_key: None,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            openweather_base_url: OPENWEATHER_BASE_URL.to_string(),
            usda_base_url: USDA_BASE_URL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            data_file: env::var("FITTRACK_DATA_FILE")
                .unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string())
                .into(),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            openai_api_key: optional_secret("OPENAI_API_KEY"),
            openweather_api_key: optional_secret("OPENWEATHER_API_KEY"),
            usda_api_key: optional_secret("USDA_API_KEY"),

            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| OPENAI_BASE_URL.to_string()),
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| OPENWEATHER_BASE_URL.to_string()),
            usda_base_url: env::var("USDA_BASE_URL").unwrap_or_else(|_| USDA_BASE_URL.to_string()),
        })
    }
}

/// Read an optional secret. Blank values count as unset.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("OPENAI_API_KEY", "   ");
        env::set_var("USDA_API_KEY", "usda-key");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.jwt_signing_key, b"test_jwt_key_32_bytes_minimum!!");
        assert_eq!(config.openai_api_key, None);
        assert_eq!(config.usda_api_key.as_deref(), Some("usda-key"));
    }
}
