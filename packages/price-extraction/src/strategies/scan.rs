//! Candidate scanning shared by the text-based strategies.
//!
//! A candidate is a numeric substring of the page text. Before it reaches the
//! plausibility validator it must parse, must not be a percentage or a date
//! fragment, must sit inside the pattern's range, and must satisfy the
//! pattern's own nearby-keyword sets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::config::ValidatorConfig;
use crate::types::outcome::{ExtractionOutcome, FailureKind};
use crate::types::request::{is_share_count_label, ExtractionRequest};
use crate::validation::{
    context_window, find_keyword, parse_number, NumberFormat, PlausibilityValidator,
};

/// Inclusive numeric range a pattern accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(with = "rust_decimal::serde::float")]
    pub min: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max: Decimal,
}

impl ValueRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Any positive value; the validator's ceiling still applies.
    pub fn any() -> Self {
        Self {
            min: Decimal::ZERO,
            max: Decimal::MAX,
        }
    }

    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self::any()
    }
}

/// Per-pattern filters applied before the shared validator.
#[derive(Debug, Clone, Default)]
pub struct CandidateRules {
    pub range: ValueRange,
    pub require_nearby: Vec<String>,
    pub forbid_nearby: Vec<String>,
    pub format: NumberFormat,
}

/// Counters kept while scanning, used to pick the failure kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub candidates: usize,
    pub parse_failures: usize,
    pub rejected: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: ScanStats) {
        self.candidates += other.candidates;
        self.parse_failures += other.parse_failures;
        self.rejected += other.rejected;
    }

    /// Failure outcome for a scan that found nothing.
    ///
    /// `InvalidInput` only when every candidate failed to parse.
    pub fn into_failure(self, strategy: &str) -> ExtractionOutcome {
        if self.candidates > 0 && self.parse_failures == self.candidates {
            ExtractionOutcome::failure(
                FailureKind::InvalidInput,
                format!(
                    "{}: {} candidate(s), none numeric",
                    strategy, self.candidates
                ),
            )
        } else {
            ExtractionOutcome::not_found(format!(
                "{}: {} candidate(s), {} rejected, {} unparseable",
                strategy, self.candidates, self.rejected, self.parse_failures
            ))
        }
    }
}

/// Validator pair for label-driven strategies, which serve both price and
/// share-count requests.
#[derive(Debug, Clone)]
pub struct LabelValidators {
    pub price: PlausibilityValidator,
    pub count: PlausibilityValidator,
}

impl Default for LabelValidators {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl LabelValidators {
    /// Price validator from `config`; the count validator keeps the same
    /// keyword lists with at least the share-count ceiling. Counts are whole
    /// numbers, so decimals-required hosts only constrain prices.
    pub fn new(config: ValidatorConfig) -> Self {
        let count = ValidatorConfig {
            ceiling: config.ceiling.max(ValidatorConfig::for_share_counts().ceiling),
            decimals_required_hosts: Vec::new(),
            ..config.clone()
        };
        Self {
            price: PlausibilityValidator::new(config),
            count: PlausibilityValidator::new(count),
        }
    }

    pub fn for_request(&self, request: &ExtractionRequest) -> &PlausibilityValidator {
        self.pick(request.wants_share_count())
    }

    pub fn for_label(&self, label: &str) -> &PlausibilityValidator {
        self.pick(is_share_count_label(label))
    }

    fn pick(&self, share_count: bool) -> &PlausibilityValidator {
        if share_count {
            &self.count
        } else {
            &self.price
        }
    }
}

/// Result of checking one candidate span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted(Decimal),
    Rejected,
    Unparseable,
}

/// Checks one candidate span of `text`.
pub fn check_candidate(
    text: &str,
    start: usize,
    end: usize,
    rules: &CandidateRules,
    validator: &PlausibilityValidator,
    source_url: &str,
) -> Verdict {
    if is_percentage(text, end) || is_date_fragment(text, start, end) {
        return Verdict::Rejected;
    }

    let Ok(value) = parse_number(&text[start..end], rules.format) else {
        return Verdict::Unparseable;
    };
    if !rules.range.contains(value) {
        return Verdict::Rejected;
    }

    let window = context_window(text, start, end, validator.config().context_window);
    let lowered = window.to_lowercase();

    if !rules.require_nearby.is_empty() && find_keyword(&lowered, &rules.require_nearby).is_none()
    {
        return Verdict::Rejected;
    }
    if find_keyword(&lowered, &rules.forbid_nearby).is_some() {
        return Verdict::Rejected;
    }

    if validator.validate(value, window, source_url) {
        Verdict::Accepted(value)
    } else {
        Verdict::Rejected
    }
}

/// Record a verdict in `stats`, returning the accepted value.
pub fn tally(stats: &mut ScanStats, verdict: Verdict) -> Option<Decimal> {
    stats.candidates += 1;
    match verdict {
        Verdict::Accepted(value) => Some(value),
        Verdict::Rejected => {
            stats.rejected += 1;
            None
        }
        Verdict::Unparseable => {
            stats.parse_failures += 1;
            None
        }
    }
}

/// Number directly followed by a percent sign.
fn is_percentage(text: &str, end: usize) -> bool {
    text[end..].trim_start().starts_with('%')
}

/// Part of "05/20/2025" or "2025-05-20".
fn is_date_fragment(text: &str, start: usize, end: usize) -> bool {
    let before: Vec<char> = text[..start].chars().rev().take(2).collect();
    let after: Vec<char> = text[end..].chars().take(2).collect();

    let slash = before.first() == Some(&'/') || after.first() == Some(&'/');
    let dash_before =
        before.first() == Some(&'-') && before.get(1).is_some_and(|c| c.is_ascii_digit());
    let dash_after =
        after.first() == Some(&'-') && after.get(1).is_some_and(|c| c.is_ascii_digit());

    slash || dash_before || dash_after
}
