//! Regex-list strategy used by custom domain handlers.
//!
//! A `PatternStrategy` owns an ordered list of patterns. Pattern order is the
//! preference order: on a page carrying both "Notes Outstanding 5,853,000"
//! and "Creation Unit 630,000", listing the outstanding pattern first is what
//! makes it win.

use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{RouteError, RouteResult};
use crate::pipeline::session::PageAccess;
use crate::strategies::scan::{
    check_candidate, tally, CandidateRules, LabelValidators, ScanStats, ValueRange,
};
use crate::traits::strategy::ExtractionStrategy;
use crate::types::{
    outcome::{ExtractionOutcome, StrategyTier},
    request::{is_share_count_label, ExtractionRequest},
};
use crate::validation::{NumberFormat, PlausibilityValidator};

/// One compiled pattern with its candidate filters.
#[derive(Debug, Clone)]
pub struct PricePattern {
    regex: Regex,
    label: String,
    rules: CandidateRules,
}

impl PricePattern {
    /// Compile `pattern`; it must contain at least one capture group around
    /// the number.
    pub fn compile(route: &str, pattern: &str, label: impl Into<String>) -> RouteResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| RouteError::InvalidPattern {
            route: route.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        if regex.captures_len() < 2 {
            return Err(RouteError::MissingCapture {
                route: route.to_string(),
                pattern: pattern.to_string(),
            });
        }

        Ok(Self {
            regex,
            label: label.into().to_lowercase(),
            rules: CandidateRules::default(),
        })
    }

    /// Restrict accepted values to `min..=max`.
    pub fn with_range(mut self, min: Decimal, max: Decimal) -> Self {
        self.rules.range = ValueRange::new(min, max);
        self
    }

    /// Require one of `keywords` near the number.
    pub fn require_nearby(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.rules.require_nearby = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self
    }

    /// Reject the number if one of `keywords` is near it.
    pub fn forbid_nearby(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.rules.forbid_nearby = keywords.into_iter().map(|k| k.into().to_lowercase()).collect();
        self
    }

    /// Set the number format.
    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.rules.format = format;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Scan `text` in document order; first accepted value wins.
    fn scan(
        &self,
        text: &str,
        validator: &PlausibilityValidator,
        source_url: &str,
    ) -> (Option<Decimal>, ScanStats) {
        let mut stats = ScanStats::default();

        for caps in self.regex.captures_iter(text) {
            let Some(number) = caps.iter().skip(1).flatten().next() else {
                continue;
            };
            let verdict = check_candidate(
                text,
                number.start(),
                number.end(),
                &self.rules,
                validator,
                source_url,
            );
            if let Some(value) = tally(&mut stats, verdict) {
                return (Some(value), stats);
            }
        }

        (None, stats)
    }
}

/// Ordered regex list bound to a domain (or used generically).
///
/// Patterns labelled as share counts only run for share-count requests, and
/// price patterns only for price requests.
pub struct PatternStrategy {
    name: String,
    tier: StrategyTier,
    patterns: Vec<PricePattern>,
    validators: LabelValidators,
}

impl PatternStrategy {
    /// Strategy for one issuer domain.
    pub fn custom(
        name: impl Into<String>,
        patterns: Vec<PricePattern>,
        validators: LabelValidators,
    ) -> Self {
        Self {
            name: name.into(),
            tier: StrategyTier::Custom,
            patterns,
            validators,
        }
    }

    /// Strategy usable on any domain.
    pub fn generic(
        name: impl Into<String>,
        patterns: Vec<PricePattern>,
        validators: LabelValidators,
    ) -> Self {
        Self {
            name: name.into(),
            tier: StrategyTier::Generic,
            patterns,
            validators,
        }
    }

    pub fn patterns(&self) -> &[PricePattern] {
        &self.patterns
    }

    /// Run every pattern over already-rendered text.
    pub fn scan_text(&self, text: &str, source_url: &str) -> ExtractionOutcome {
        self.scan_patterns(self.patterns.iter(), text, source_url)
    }

    /// Run the patterns that match the request's kind (price or count).
    pub fn scan_for(
        &self,
        request: &ExtractionRequest,
        text: &str,
        source_url: &str,
    ) -> ExtractionOutcome {
        let wants_count = request.wants_share_count();
        let applicable = self
            .patterns
            .iter()
            .filter(|p| is_share_count_label(p.label()) == wants_count);
        self.scan_patterns(applicable, text, source_url)
    }

    fn scan_patterns<'p>(
        &self,
        patterns: impl Iterator<Item = &'p PricePattern>,
        text: &str,
        source_url: &str,
    ) -> ExtractionOutcome {
        let mut stats = ScanStats::default();

        for pattern in patterns {
            let validator = self.validators.for_label(pattern.label());
            let (found, pattern_stats) = pattern.scan(text, validator, source_url);
            stats.merge(pattern_stats);
            if let Some(value) = found {
                debug!(
                    strategy = %self.name,
                    pattern = pattern.as_str(),
                    %value,
                    "pattern matched"
                );
                return ExtractionOutcome::success(value, pattern.label());
            }
        }

        stats.into_failure(&self.name)
    }
}

#[async_trait]
impl ExtractionStrategy for PatternStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> StrategyTier {
        self.tier
    }

    async fn attempt(
        &self,
        request: &ExtractionRequest,
        page: &mut PageAccess<'_>,
    ) -> ExtractionOutcome {
        match page.load(&request.url).await {
            Ok(snapshot) => self.scan_for(request, &snapshot.text, &snapshot.final_url),
            Err(err) => err.into(),
        }
    }
}
