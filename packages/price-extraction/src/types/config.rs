//! Configuration types for validation and the escalation pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default ceiling for price values.
pub const DEFAULT_PRICE_CEILING: i64 = 100_000;

/// Default ceiling for share/note counts.
pub const DEFAULT_COUNT_CEILING: i64 = 100_000_000_000;

/// Tuning for the plausibility validator.
///
/// The keyword lists are matched case-insensitively against the text window
/// around a candidate number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Largest believable value (inclusive).
    #[serde(with = "rust_decimal::serde::float")]
    pub ceiling: Decimal,

    /// Characters examined on each side of a match.
    pub context_window: usize,

    /// Keywords that vouch for a whole-number value.
    pub allow_keywords: Vec<String>,

    /// Keywords that mark a number as fund metadata rather than a price.
    pub deny_keywords: Vec<String>,

    /// Keywords that mark a four-digit number as a calendar year.
    pub year_keywords: Vec<String>,

    /// Inclusive year range treated as calendar years.
    pub year_range: (u32, u32),

    /// Hosts (suffix match) whose values must carry decimals.
    #[serde(default)]
    pub decimals_required_hosts: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            ceiling: Decimal::from(DEFAULT_PRICE_CEILING),
            context_window: 48,
            allow_keywords: to_strings(&[
                "price",
                "nav",
                "closing",
                "close",
                "last traded",
                "last trade",
                "market value",
                "kurs",
                "outstanding",
                "shares in issue",
                "units in issue",
                "securities in issue",
            ]),
            deny_keywords: to_strings(&[
                "protection level",
                "protection",
                "downside",
                "fund size",
                "aum",
                "assets under management",
                "net assets",
                "version",
                "rating",
                "expense ratio",
                "ter",
                "inception year",
            ]),
            year_keywords: to_strings(&["launch", "launched", "inception"]),
            year_range: (1900, 2100),
            decimals_required_hosts: Vec::new(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ValidatorConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config tuned for share and note counts: whole numbers are the norm and
    /// the ceiling is far above any price.
    pub fn for_share_counts() -> Self {
        Self {
            ceiling: Decimal::from(DEFAULT_COUNT_CEILING),
            ..Self::default()
        }
    }

    /// Set the ceiling.
    pub fn with_ceiling(mut self, ceiling: Decimal) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Set the plausibility window.
    pub fn with_context_window(mut self, chars: usize) -> Self {
        self.context_window = chars;
        self
    }

    /// Add allow-listed keywords.
    pub fn allow(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allow_keywords
            .extend(keywords.into_iter().map(|k| k.into().to_lowercase()));
        self
    }

    /// Add deny-listed keywords.
    pub fn deny(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.deny_keywords
            .extend(keywords.into_iter().map(|k| k.into().to_lowercase()));
        self
    }

    /// Require decimals for values coming from this host.
    pub fn require_decimals_for(mut self, host: impl Into<String>) -> Self {
        self.decimals_required_hosts
            .push(host.into().to_lowercase());
        self
    }
}

/// Configuration for the escalation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Bounded wait for a page to become ready, in milliseconds.
    pub load_timeout_ms: u64,

    /// Consult the AI tier when all other tiers fail.
    ///
    /// Requests can still opt out individually.
    pub ai_fallback: bool,

    /// Validator defaults for routes that do not override them.
    pub validator: ValidatorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 30_000,
            ai_fallback: true,
            validator: ValidatorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page load timeout.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Enable or disable the AI tier.
    pub fn with_ai_fallback(mut self, enabled: bool) -> Self {
        self.ai_fallback = enabled;
        self
    }

    /// Replace the default validator config.
    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validator = validator;
        self
    }

    /// The page load timeout.
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_count_ceiling_exceeds_price_ceiling() {
        assert!(ValidatorConfig::for_share_counts().ceiling > ValidatorConfig::default().ceiling);
    }

    #[test]
    fn test_builders_lowercase_keywords() {
        let config = ValidatorConfig::new()
            .allow(["Settlement Price"])
            .deny(["Barrier Level"])
            .require_decimals_for("Example.COM");

        assert!(config.allow_keywords.contains(&"settlement price".to_string()));
        assert!(config.deny_keywords.contains(&"barrier level".to_string()));
        assert_eq!(config.decimals_required_hosts, vec!["example.com"]);
    }

    #[test]
    fn test_pipeline_timeout_roundtrip() {
        let config = PipelineConfig::new().with_load_timeout(Duration::from_secs(5));
        assert_eq!(config.load_timeout(), Duration::from_secs(5));
    }
}
