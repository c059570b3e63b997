//! Outcome types produced by strategy attempts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a strategy (or the whole pipeline) produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Nothing plausible on the page. Expected and common.
    NotFound,

    /// Page never reached a ready state within the bounded wait.
    LoadTimeout,

    /// Captured text was not a number. Escalates like `NotFound`.
    InvalidInput,

    /// Every strategy, including the AI tier when enabled, failed.
    ExhaustedAllTiers,
}

impl FailureKind {
    /// Whether the controller should keep trying other strategies.
    pub fn escalates(&self) -> bool {
        !matches!(self, FailureKind::ExhaustedAllTiers)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::LoadTimeout => "load_timeout",
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::ExhaustedAllTiers => "exhausted_all_tiers",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// A plausible value was found
    Success {
        #[serde(with = "rust_decimal::serde::float")]
        value: Decimal,
        /// Label the value was found under (e.g. "closing price")
        label: String,
    },

    /// No value; `detail` is a short human-readable reason
    Failure { kind: FailureKind, detail: String },
}

impl ExtractionOutcome {
    /// Create a success outcome.
    pub fn success(value: Decimal, label: impl Into<String>) -> Self {
        Self::Success {
            value,
            label: label.into(),
        }
    }

    /// Create a failure outcome.
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::failure(FailureKind::NotFound, detail)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The extracted value, if any.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Success { value, .. } => Some(*value),
            Self::Failure { .. } => None,
        }
    }

    /// The failure kind, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Escalation tiers, in the order the controller tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTier {
    /// Handler bound to one issuer domain
    Custom,

    /// JSON endpoint lookup derived from the page URL
    Api,

    /// Label-driven text and table heuristics
    Generic,

    /// LLM analysis of the rendered page; always last
    Ai,
}

impl StrategyTier {
    /// Tiers in escalation order.
    pub const ORDER: [StrategyTier; 4] = [
        StrategyTier::Custom,
        StrategyTier::Api,
        StrategyTier::Generic,
        StrategyTier::Ai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTier::Custom => "custom",
            StrategyTier::Api => "api",
            StrategyTier::Generic => "generic",
            StrategyTier::Ai => "ai",
        }
    }
}

impl fmt::Display for StrategyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
