//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the library without a
//! real browser or AI service. Every mock records its calls behind an
//! `Arc<RwLock<_>>`, so a clone kept by the test can observe a mock that was
//! moved into the pipeline.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::browsers::render::visible_text;
use crate::error::{BrowserError, BrowserResult, ExtractionError, Result};
use crate::pipeline::session::PageAccess;
use crate::traits::{analyzer::PriceAnalyzer, browser::Browser, strategy::ExtractionStrategy};
use crate::types::{
    outcome::{ExtractionOutcome, StrategyTier},
    request::ExtractionRequest,
};

/// Canned page served by [`MockBrowser`].
#[derive(Debug, Clone)]
struct MockPage {
    html: String,
    text: String,
    final_url: String,
}

/// A mock browser for testing.
///
/// Serves canned pages by exact URL. URLs registered with
/// [`with_timeout`](Self::with_timeout) never become ready; anything else
/// fails navigation with HTTP 404.
#[derive(Clone, Default)]
pub struct MockBrowser {
    pages: HashMap<String, MockPage>,
    timeouts: HashSet<String>,
    pending: Option<String>,
    current: Option<String>,
    navigations: Arc<RwLock<Vec<String>>>,
    shutdowns: Arc<RwLock<usize>>,
}

impl MockBrowser {
    /// Create an empty mock browser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve an HTML page; its visible text is rendered the same way the
    /// HTTP browser renders it.
    pub fn with_html_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let html = html.into();
        let text = visible_text(&html);
        self.pages.insert(
            url.clone(),
            MockPage {
                html,
                text,
                final_url: url,
            },
        );
        self
    }

    /// Serve a page whose visible text is exactly `text`.
    pub fn with_text_page(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        let url = url.into();
        let text = text.into();
        self.pages.insert(
            url.clone(),
            MockPage {
                html: format!("<html><body><p>{}</p></body></html>", text),
                text,
                final_url: url,
            },
        );
        self
    }

    /// Make `url` redirect to `final_url` (the page must already be added).
    pub fn with_redirect(mut self, url: &str, final_url: impl Into<String>) -> Self {
        if let Some(page) = self.pages.get_mut(url) {
            page.final_url = final_url.into();
        }
        self
    }

    /// Make `url` never become ready.
    pub fn with_timeout(mut self, url: impl Into<String>) -> Self {
        self.timeouts.insert(url.into());
        self
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.read().unwrap().clone()
    }

    /// Number of times `shutdown` was called.
    pub fn shutdown_count(&self) -> usize {
        *self.shutdowns.read().unwrap()
    }

    fn page(&self) -> BrowserResult<&MockPage> {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .ok_or(BrowserError::NoPage)
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.navigations.write().unwrap().push(url.to_string());
        self.current = None;

        if self.pages.contains_key(url) || self.timeouts.contains(url) {
            self.pending = Some(url.to_string());
            Ok(())
        } else {
            Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            })
        }
    }

    async fn wait_until_ready(&mut self, _timeout: Duration) -> BrowserResult<()> {
        let url = self.pending.take().ok_or(BrowserError::NoPage)?;
        if self.timeouts.contains(&url) {
            return Err(BrowserError::Timeout { url });
        }
        self.current = Some(url);
        Ok(())
    }

    async fn rendered_text(&mut self) -> BrowserResult<String> {
        Ok(self.page()?.text.clone())
    }

    async fn dom(&mut self) -> BrowserResult<String> {
        Ok(self.page()?.html.clone())
    }

    fn current_url(&self) -> Option<String> {
        self.page().ok().map(|p| p.final_url.clone())
    }

    async fn shutdown(&mut self) -> BrowserResult<()> {
        *self.shutdowns.write().unwrap() += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// How [`MockAnalyzer`] answers.
#[derive(Debug, Clone)]
enum MockAnswer {
    Value(Option<Decimal>),
    Error(String),
}

/// A mock AI analyzer with a fixed answer and call tracking.
#[derive(Clone)]
pub struct MockAnalyzer {
    answer: MockAnswer,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockAnalyzer {
    /// Analyzer that always answers `value`.
    pub fn returning(value: Option<Decimal>) -> Self {
        Self {
            answer: MockAnswer::Value(value),
            calls: Arc::default(),
        }
    }

    /// Analyzer that always fails with a service error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: MockAnswer::Error(message.into()),
            calls: Arc::default(),
        }
    }

    /// URLs the analyzer was asked about, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PriceAnalyzer for MockAnalyzer {
    async fn analyze(
        &self,
        _page_content: &str,
        url: &str,
        _labels: &[String],
    ) -> Result<Option<Decimal>> {
        self.calls.write().unwrap().push(url.to_string());
        match &self.answer {
            MockAnswer::Value(v) => Ok(*v),
            MockAnswer::Error(msg) => Err(ExtractionError::AI(msg.clone().into())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A strategy that returns a fixed outcome and counts its invocations.
#[derive(Clone)]
pub struct ScriptedStrategy {
    name: String,
    tier: StrategyTier,
    outcome: ExtractionOutcome,
    calls: Arc<RwLock<usize>>,
}

impl ScriptedStrategy {
    pub fn new(name: impl Into<String>, tier: StrategyTier, outcome: ExtractionOutcome) -> Self {
        Self {
            name: name.into(),
            tier,
            outcome,
            calls: Arc::default(),
        }
    }

    /// How many times `attempt` ran.
    pub fn calls(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl ExtractionStrategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> StrategyTier {
        self.tier
    }

    async fn attempt(
        &self,
        _request: &ExtractionRequest,
        _page: &mut PageAccess<'_>,
    ) -> ExtractionOutcome {
        *self.calls.write().unwrap() += 1;
        self.outcome.clone()
    }
}
