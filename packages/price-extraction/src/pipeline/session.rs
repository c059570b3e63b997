//! Per-request page access over the shared browser session.
//!
//! Several strategies usually read the same page. `PageAccess` navigates to
//! each URL at most once per request and hands every strategy the same
//! snapshot, so a slow page costs one bounded wait rather than one per tier.
//! A failed load is cached too: the next strategy sees the same failure
//! instead of retrying the navigation.

use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::BrowserError;
use crate::traits::browser::Browser;
use crate::types::{
    outcome::{ExtractionOutcome, FailureKind},
    page::PageSnapshot,
};

/// Why a page could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoadError {
    pub kind: FailureKind,
    pub detail: String,
}

impl From<PageLoadError> for ExtractionOutcome {
    fn from(err: PageLoadError) -> Self {
        ExtractionOutcome::failure(err.kind, err.detail)
    }
}

impl From<BrowserError> for PageLoadError {
    fn from(err: BrowserError) -> Self {
        let kind = match err {
            BrowserError::Timeout { .. } => FailureKind::LoadTimeout,
            _ => FailureKind::NotFound,
        };
        Self {
            kind,
            detail: err.to_string(),
        }
    }
}

/// Page loader bound to one request.
pub struct PageAccess<'a> {
    browser: &'a mut dyn Browser,
    timeout: Duration,
    pages: HashMap<String, Result<PageSnapshot, PageLoadError>>,
    navigations: usize,
}

impl<'a> PageAccess<'a> {
    pub fn new(browser: &'a mut dyn Browser, timeout: Duration) -> Self {
        Self {
            browser,
            timeout,
            pages: HashMap::new(),
            navigations: 0,
        }
    }

    /// Load `url` (once) and return its snapshot.
    pub async fn load(&mut self, url: &str) -> Result<&PageSnapshot, PageLoadError> {
        if !self.pages.contains_key(url) {
            let loaded = self.fetch(url).await;
            self.pages.insert(url.to_string(), loaded);
        }

        match self.pages.get(url) {
            Some(Ok(page)) => Ok(page),
            Some(Err(err)) => Err(err.clone()),
            None => Err(PageLoadError {
                kind: FailureKind::NotFound,
                detail: format!("page cache lost {}", url),
            }),
        }
    }

    /// Number of navigations performed so far.
    pub fn navigations(&self) -> usize {
        self.navigations
    }

    async fn fetch(&mut self, url: &str) -> Result<PageSnapshot, PageLoadError> {
        self.navigations += 1;
        debug!(url = %url, browser = self.browser.name(), "navigating");

        self.browser.navigate(url).await.map_err(|e| {
            warn!(url = %url, error = %e, "navigation failed");
            PageLoadError::from(e)
        })?;

        self.browser
            .wait_until_ready(self.timeout)
            .await
            .map_err(|e| {
                warn!(
                    url = %url,
                    error = %e,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "page not ready"
                );
                PageLoadError::from(e)
            })?;

        let text = self.browser.rendered_text().await?;
        let html = self.browser.dom().await?;
        let final_url = self
            .browser
            .current_url()
            .unwrap_or_else(|| url.to_string());

        Ok(PageSnapshot::new(url, text, html).with_final_url(final_url))
    }
}
