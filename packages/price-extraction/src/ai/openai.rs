//! OpenAI implementation of the `PriceAnalyzer` trait.
//!
//! Sends the rendered page text to the chat completions endpoint and asks
//! for a single JSON object `{"value": <number or null>}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use price_extraction::ai::OpenAiAnalyzer;
//!
//! let ai = OpenAiAnalyzer::new("sk-...").with_model("gpt-4o-mini");
//! let router = DomainRouter::builder().with_analyzer(Arc::new(ai)).build()?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::secret::SecretString;
use crate::traits::analyzer::PriceAnalyzer;
use crate::validation::{parse_number, NumberFormat};

const SYSTEM_PROMPT: &str = "You read text scraped from exchange-traded fund and \
exchange-traded note web pages. Find the single figure published under one of the \
requested labels. Answer with a JSON object {\"value\": number} using a plain number \
without currency symbols or thousands separators, or {\"value\": null} if the page does \
not state it. Never estimate, never return percentages, years, fund sizes or ratings.";

/// OpenAI-based analyzer.
#[derive(Clone)]
pub struct OpenAiAnalyzer {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiAnalyzer")
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiAnalyzer {
    /// Create a new analyzer with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::new(api_key),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Build from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|e| ExtractionError::Config(format!("OPENAI_API_KEY: {}", e).into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at an OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let body = CompletionBody {
            model: &self.model,
            messages: [
                Message { role: "system", content: system },
                Message { role: "user", content: user },
            ],
            temperature: 0.0,
            response_format: JsonMode { kind: "json_object" },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(ExtractionError::AI(
                format!("completion request failed with {}: {}", status, reason).into(),
            ));
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|e| ExtractionError::AI(Box::new(e)))?;

        completion
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| ExtractionError::AI("completion had no content".into()))
    }
}

fn user_prompt(page_content: &str, url: &str, labels: &[String]) -> String {
    format!(
        "URL: {}\nRequested labels (in order of preference): {}\n\nPage text:\n{}",
        url,
        labels.join(", "),
        page_content
    )
}

/// Read `{"value": ...}` out of a model answer, tolerating code fences.
fn parse_answer(content: &str) -> Result<Option<Decimal>> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let answer: AnswerJson = serde_json::from_str(trimmed)?;
    match answer.value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => {
            let literal = n.to_string();
            Decimal::from_str(&literal)
                .or_else(|_| Decimal::from_scientific(&literal))
                .map(Some)
                .map_err(|e| {
                    ExtractionError::AI(format!("unusable value {}: {}", literal, e).into())
                })
        }
        serde_json::Value::String(s) => parse_number(&s, NumberFormat::Auto)
            .map(Some)
            .map_err(|e| ExtractionError::AI(Box::new(e))),
        other => Err(ExtractionError::AI(
            format!("unexpected value in answer: {}", other).into(),
        )),
    }
}

#[async_trait]
impl PriceAnalyzer for OpenAiAnalyzer {
    async fn analyze(
        &self,
        page_content: &str,
        url: &str,
        labels: &[String],
    ) -> Result<Option<Decimal>> {
        debug!(url = %url, model = %self.model, chars = page_content.len(), "asking OpenAI");
        let content = self
            .chat(SYSTEM_PROMPT, &user_prompt(page_content, url, labels))
            .await?;
        parse_answer(&content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// Wire types for the chat completions endpoint

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    response_format: JsonMode,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct JsonMode {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct AnswerJson {
    #[serde(default)]
    value: serde_json::Value,
}
