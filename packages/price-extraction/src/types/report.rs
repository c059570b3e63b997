//! Normalized per-URL results handed to the persistence layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::outcome::StrategyTier;

/// Key used for failures.
pub const ERROR_KEY: &str = "error";

/// A cell value in a normalized result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Number(#[serde(with = "rust_decimal::serde::float")] Decimal),
    Text(String),
}

/// Single-key mapping: `{label: value}` on success, `{"error": msg}` on
/// failure. Serializes as a plain JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedResult(BTreeMap<String, ReportValue>);

impl NormalizedResult {
    /// Result carrying a value under `label`.
    pub fn success(label: impl Into<String>, value: Decimal) -> Self {
        let mut map = BTreeMap::new();
        map.insert(label.into(), ReportValue::Number(value));
        Self(map)
    }

    /// Result carrying a diagnostic message.
    pub fn error(message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(ERROR_KEY.to_string(), ReportValue::Text(message.into()));
        Self(map)
    }

    /// Value stored under `label`, if any.
    pub fn value(&self, label: &str) -> Option<Decimal> {
        match self.0.get(label) {
            Some(ReportValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// The diagnostic message, if this is a failure.
    pub fn error_message(&self) -> Option<&str> {
        match self.0.get(ERROR_KEY) {
            Some(ReportValue::Text(msg)) => Some(msg),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message().is_some()
    }

    /// Keys in the mapping (always exactly one).
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// One processed request as written to a sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRow {
    /// Position of the request in the batch input
    pub index: usize,

    pub url: String,

    pub result: NormalizedResult,

    /// Strategy that produced the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,

    /// Tier that produced the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<StrategyTier>,

    pub processed_at: DateTime<Utc>,
}
