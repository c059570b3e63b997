//! Rendered page snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a strategy sees of a loaded page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// URL that was navigated to
    pub url: String,

    /// URL after redirects
    pub final_url: String,

    /// Visible text, whitespace-collapsed
    pub text: String,

    /// Raw DOM (HTML)
    pub html: String,

    /// When the page became ready
    pub loaded_at: DateTime<Utc>,
}

impl PageSnapshot {
    /// Create a snapshot; `final_url` defaults to `url`.
    pub fn new(url: impl Into<String>, text: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            text: text.into(),
            html: html.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Set the post-redirect URL.
    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = final_url.into();
        self
    }

    /// Check if this page has visible text.
    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Text trimmed to at most `max_chars` characters, for prompts.
    pub fn text_excerpt(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}
