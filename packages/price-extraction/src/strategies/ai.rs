//! Last-resort strategy: ask a language model to read the page.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::pipeline::session::PageAccess;
use crate::strategies::scan::LabelValidators;
use crate::traits::{analyzer::PriceAnalyzer, strategy::ExtractionStrategy};
use crate::types::{
    outcome::{ExtractionOutcome, StrategyTier},
    request::ExtractionRequest,
};

/// Page text sent to the model, in characters.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 12_000;

/// Wraps a [`PriceAnalyzer`]. The answer still goes through the plausibility
/// validator; a model is as happy to return a launch year as a scraper is.
pub struct AiFallbackStrategy {
    analyzer: Arc<dyn PriceAnalyzer>,
    validators: LabelValidators,
    max_chars: usize,
}

impl AiFallbackStrategy {
    pub fn new(analyzer: Arc<dyn PriceAnalyzer>) -> Self {
        Self {
            analyzer,
            validators: LabelValidators::default(),
            max_chars: DEFAULT_MAX_PROMPT_CHARS,
        }
    }

    pub fn with_validators(mut self, validators: LabelValidators) -> Self {
        self.validators = validators;
        self
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

#[async_trait]
impl ExtractionStrategy for AiFallbackStrategy {
    fn name(&self) -> &str {
        "ai-fallback"
    }

    fn tier(&self) -> StrategyTier {
        StrategyTier::Ai
    }

    async fn attempt(
        &self,
        request: &ExtractionRequest,
        page: &mut PageAccess<'_>,
    ) -> ExtractionOutcome {
        let snapshot = match page.load(&request.url).await {
            Ok(snapshot) => snapshot,
            Err(err) => return err.into(),
        };
        if !snapshot.has_content() {
            return ExtractionOutcome::not_found("ai-fallback: page has no visible text");
        }

        let answer = self
            .analyzer
            .analyze(
                snapshot.text_excerpt(self.max_chars),
                &snapshot.final_url,
                &request.labels,
            )
            .await;

        match answer {
            Ok(Some(value)) => {
                let context = request.labels.join(" ");
                let validator = self.validators.for_request(request);
                if validator.validate(value, &context, &snapshot.final_url) {
                    debug!(analyzer = self.analyzer.name(), %value, "AI answer accepted");
                    ExtractionOutcome::success(value, request.primary_label())
                } else {
                    ExtractionOutcome::not_found(format!(
                        "ai-fallback: {} answered {} which failed plausibility",
                        self.analyzer.name(),
                        value
                    ))
                }
            }
            Ok(None) => ExtractionOutcome::not_found(format!(
                "ai-fallback: {} found no value",
                self.analyzer.name()
            )),
            Err(e) => {
                warn!(
                    analyzer = self.analyzer.name(),
                    url = %request.url,
                    error = %e,
                    "AI analysis failed"
                );
                ExtractionOutcome::not_found(format!("ai-fallback: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAnalyzer, MockBrowser};
    use crate::types::outcome::FailureKind;
    use rust_decimal::Decimal;
    use std::time::Duration;

    const URL: &str = "https://funds.example/etf";

    async fn run(analyzer: MockAnalyzer, request: ExtractionRequest) -> ExtractionOutcome {
        let mut browser = MockBrowser::new().with_text_page(URL, "Some fund page without labels");
        let mut page = PageAccess::new(&mut browser, Duration::from_secs(1));
        AiFallbackStrategy::new(Arc::new(analyzer))
            .attempt(&request, &mut page)
            .await
    }

    #[tokio::test]
    async fn test_answer_is_validated() {
        let price = Decimal::new(2315, 2);
        let ok = run(MockAnalyzer::returning(Some(price)), ExtractionRequest::new(URL)).await;
        assert_eq!(ok, ExtractionOutcome::success(price, "market price"));

        let too_big = run(
            MockAnalyzer::returning(Some(Decimal::from(2_000_000))),
            ExtractionRequest::new(URL),
        )
        .await;
        assert_eq!(too_big.failure_kind(), Some(FailureKind::NotFound));
    }

    #[tokio::test]
    async fn test_share_count_answer() {
        let request = ExtractionRequest::new(URL).with_labels(["shares outstanding"]);
        let outcome = run(MockAnalyzer::returning(Some(Decimal::from(2_000_000))), request).await;
        assert_eq!(outcome.value(), Some(Decimal::from(2_000_000)));
    }

    #[tokio::test]
    async fn test_service_error_is_not_found() {
        let analyzer = MockAnalyzer::failing("rate limited");
        let observer = analyzer.clone();
        let outcome = run(analyzer, ExtractionRequest::new(URL)).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::NotFound));
        assert_eq!(observer.calls(), vec![URL]);
    }

    #[tokio::test]
    async fn test_no_answer() {
        let outcome = run(MockAnalyzer::returning(None), ExtractionRequest::new(URL)).await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::NotFound));
    }
}
