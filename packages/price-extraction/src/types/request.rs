//! Extraction requests.

use serde::{Deserialize, Serialize};

/// Label used when a caller does not name one.
pub const DEFAULT_LABEL: &str = "market price";

/// One URL to enrich, plus the labels a value may be published under.
///
/// The first label is the primary label: results are reported under it even
/// when the value was found under one of the alternates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Target page
    pub url: String,

    /// Acceptable labels, primary first (lowercase)
    pub labels: Vec<String>,

    /// Whether the AI tier may be consulted for this request
    #[serde(default = "default_true")]
    pub ai_fallback: bool,
}

fn default_true() -> bool {
    true
}

/// Whether `label` names a share or note count rather than a price.
pub fn is_share_count_label(label: &str) -> bool {
    let label = label.to_lowercase();
    label.contains("outstanding") || label.contains("shares") || label.contains("units")
}

impl ExtractionRequest {
    /// Create a request for the default "market price" label.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().to_string(),
            labels: vec![DEFAULT_LABEL.to_string()],
            ai_fallback: true,
        }
    }

    /// Replace the labels. Empty or blank labels are dropped; if nothing is
    /// left the default label is kept.
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut cleaned: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into().trim().to_lowercase();
            if !label.is_empty() && !cleaned.contains(&label) {
                cleaned.push(label);
            }
        }
        if !cleaned.is_empty() {
            self.labels = cleaned;
        }
        self
    }

    /// Add one alternate label.
    pub fn with_label(self, label: impl Into<String>) -> Self {
        let mut labels = self.labels.clone();
        labels.push(label.into());
        self.with_labels(labels)
    }

    /// Disable the AI tier for this request.
    pub fn without_ai_fallback(mut self) -> Self {
        self.ai_fallback = false;
        self
    }

    /// The label results are keyed by.
    pub fn primary_label(&self) -> &str {
        self.labels
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_LABEL)
    }

    /// Whether the request asks for a share count rather than a price.
    pub fn wants_share_count(&self) -> bool {
        self.labels.iter().any(|l| is_share_count_label(l))
    }
}
