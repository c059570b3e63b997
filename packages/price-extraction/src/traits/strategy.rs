//! Strategy trait implemented by every extraction tier.

use async_trait::async_trait;

use crate::pipeline::session::PageAccess;
use crate::types::{
    outcome::{ExtractionOutcome, StrategyTier},
    request::ExtractionRequest,
};

/// One way of getting a value for a request.
///
/// Strategies are stateless and shared (`Arc<dyn ExtractionStrategy>`); all
/// page access goes through the per-request [`PageAccess`]. A strategy never
/// returns an error: every miss is an [`ExtractionOutcome::Failure`] the
/// controller escalates past.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Stable name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Tier this strategy belongs to.
    fn tier(&self) -> StrategyTier;

    /// Try to extract a value.
    async fn attempt(
        &self,
        request: &ExtractionRequest,
        page: &mut PageAccess<'_>,
    ) -> ExtractionOutcome;
}
