//! Browser trait: the page-loading capability strategies call into.
//!
//! A browser is a stateful session: navigation replaces the current page for
//! every caller. The pipeline therefore holds exactly one session per batch
//! and passes it around as `&mut dyn Browser`; nothing shares it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use price_extraction::{Browser, HttpBrowser};
//! use std::time::Duration;
//!
//! let mut browser = HttpBrowser::new()?;
//! browser.navigate("https://example.com/etf").await?;
//! browser.wait_until_ready(Duration::from_secs(30)).await?;
//! let text = browser.rendered_text().await?;
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::error::BrowserResult;

/// Browser-automation capability surface.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Start loading `url`. Does not wait for the page to settle.
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Block until the current page is ready or `timeout` elapses.
    ///
    /// Returns `BrowserError::Timeout` when the page does not settle in time.
    async fn wait_until_ready(&mut self, timeout: Duration) -> BrowserResult<()>;

    /// Visible text of the current page.
    async fn rendered_text(&mut self) -> BrowserResult<String>;

    /// DOM of the current page as HTML.
    async fn dom(&mut self) -> BrowserResult<String>;

    /// URL of the current page after redirects, if any page is loaded.
    fn current_url(&self) -> Option<String>;

    /// Release the session. Called once when a batch ends.
    async fn shutdown(&mut self) -> BrowserResult<()> {
        Ok(())
    }

    /// Get the browser name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
