//! HTTP-based browser implementation.
//!
//! Fetches pages with `reqwest` and renders visible text with `scraper`. It
//! does not execute JavaScript; issuer pages that build their price tables
//! client-side need a real browser behind the [`Browser`] trait.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::browsers::render::visible_text;
use crate::error::{BrowserError, BrowserResult};
use crate::traits::browser::Browser;

/// Loaded page state.
struct LoadedPage {
    final_url: String,
    html: String,
}

/// Browser session backed by plain HTTP requests.
///
/// # Example
///
/// ```rust,ignore
/// use price_extraction::browsers::HttpBrowser;
///
/// let browser = HttpBrowser::new()?.with_user_agent("Mozilla/5.0 (X11; Linux x86_64)");
/// ```
pub struct HttpBrowser {
    client: reqwest::Client,
    user_agent: String,
    pending: Option<String>,
    current: Option<LoadedPage>,
}

impl HttpBrowser {
    /// Create a new HTTP browser with default settings.
    pub fn new() -> BrowserResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| BrowserError::Http(Box::new(e)))?;

        Ok(Self {
            client,
            user_agent: "Mozilla/5.0 (compatible; etf-enrich/0.1)".to_string(),
            pending: None,
            current: None,
        })
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    async fn fetch(&self, url: &str) -> BrowserResult<LoadedPage> {
        debug!(url = %url, "HTTP fetch starting");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept-Language", "en-US,en;q=0.8")
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "HTTP request failed");
                BrowserError::Http(Box::new(e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| BrowserError::Http(Box::new(e)))?;

        Ok(LoadedPage { final_url, html })
    }

    fn page(&self) -> BrowserResult<&LoadedPage> {
        self.current.as_ref().ok_or(BrowserError::NoPage)
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        let parsed = url::Url::parse(url).map_err(|_| BrowserError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BrowserError::InvalidUrl {
                url: url.to_string(),
            });
        }

        self.current = None;
        self.pending = Some(url.to_string());
        Ok(())
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> BrowserResult<()> {
        let url = self.pending.take().ok_or(BrowserError::NoPage)?;

        match tokio::time::timeout(timeout, self.fetch(&url)).await {
            Ok(Ok(page)) => {
                self.current = Some(page);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BrowserError::Timeout { url }),
        }
    }

    async fn rendered_text(&mut self) -> BrowserResult<String> {
        Ok(visible_text(&self.page()?.html))
    }

    async fn dom(&mut self) -> BrowserResult<String> {
        Ok(self.page()?.html.clone())
    }

    fn current_url(&self) -> Option<String> {
        self.current.as_ref().map(|p| p.final_url.clone())
    }

    async fn shutdown(&mut self) -> BrowserResult<()> {
        self.pending = None;
        self.current = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_navigate_rejects_non_http_schemes() {
        let mut browser = HttpBrowser::new().unwrap();
        let err = browser.navigate("file:///etc/passwd").await.unwrap_err();
        assert!(matches!(err, BrowserError::InvalidUrl { .. }));

        let err = browser.navigate("not a url").await.unwrap_err();
        assert!(matches!(err, BrowserError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_accessors_without_page() {
        let mut browser = HttpBrowser::new().unwrap();
        assert!(browser.current_url().is_none());
        assert!(matches!(
            browser.rendered_text().await,
            Err(BrowserError::NoPage)
        ));
        assert!(matches!(
            browser.wait_until_ready(Duration::from_millis(10)).await,
            Err(BrowserError::NoPage)
        ));
    }
}
