//! AI trait for the last-resort extraction tier.
//!
//! The prompt and model are the implementation's business; the pipeline only
//! needs "here is a page, is there a value on it".

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;

/// LLM-backed reader of a rendered page.
#[async_trait]
pub trait PriceAnalyzer: Send + Sync {
    /// Look for the value published under one of `labels` in `page_content`.
    ///
    /// Returns `Ok(None)` when the model finds nothing. Errors are service
    /// failures (network, quota, malformed response).
    async fn analyze(
        &self,
        page_content: &str,
        url: &str,
        labels: &[String],
    ) -> Result<Option<Decimal>>;

    /// Get the analyzer name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}
