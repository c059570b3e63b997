use anyhow::{Context, Result};
use dotenvy::dotenv;
use price_extraction::SecretString;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent key disables the AI tier
    pub openai_api_key: Option<SecretString>,
    pub openai_model: String,
    pub load_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .map(SecretString::from)
                .filter(|key| !key.is_blank()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            load_timeout_secs: env::var("ENRICH_LOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("ENRICH_LOAD_TIMEOUT_SECS must be a whole number of seconds")?,
            user_agent: env::var("ENRICH_USER_AGENT").ok(),
        })
    }
}
