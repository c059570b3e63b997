//! Plausibility filter for candidate prices and share counts.
//!
//! Issuer pages surround the figure we want with dozens of similar numbers:
//! launch years, protection levels, fund sizes, TERs, rating scores. Every
//! strategy runs its candidates through this one filter.

use rust_decimal::Decimal;
use std::fmt;
use tracing::trace;

use crate::domain::{host_matches, normalize_host};
use crate::types::config::ValidatorConfig;
use crate::validation::numeric::is_flat;

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Zero or negative
    NonPositive,

    /// Above the configured ceiling
    AboveCeiling,

    /// Whole number in the year range next to a year keyword
    CalendarYear,

    /// Whole number from a host that always publishes decimals
    DecimalsRequired,

    /// Deny-listed keyword near the number
    DenyKeyword(String),

    /// Whole number without any price keyword nearby
    FlatWithoutPriceContext,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NonPositive => write!(f, "not positive"),
            Rejection::AboveCeiling => write!(f, "above ceiling"),
            Rejection::CalendarYear => write!(f, "looks like a year"),
            Rejection::DecimalsRequired => write!(f, "host requires decimals"),
            Rejection::DenyKeyword(k) => write!(f, "near {:?}", k),
            Rejection::FlatWithoutPriceContext => write!(f, "whole number without price context"),
        }
    }
}

/// Consolidated plausibility predicate.
#[derive(Debug, Clone)]
pub struct PlausibilityValidator {
    config: ValidatorConfig,
}

impl Default for PlausibilityValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl PlausibilityValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Whether `value`, seen inside `context_text` on `source_url`, is a
    /// believable price or share count.
    pub fn validate(&self, value: Decimal, context_text: &str, source_url: &str) -> bool {
        match self.judge(value, context_text, source_url) {
            Ok(()) => true,
            Err(reason) => {
                trace!(%value, url = %source_url, %reason, "candidate rejected");
                false
            }
        }
    }

    /// Same as [`validate`](Self::validate) but reports the reason.
    pub fn judge(
        &self,
        value: Decimal,
        context_text: &str,
        source_url: &str,
    ) -> Result<(), Rejection> {
        if value <= Decimal::ZERO {
            return Err(Rejection::NonPositive);
        }
        if value > self.config.ceiling {
            return Err(Rejection::AboveCeiling);
        }

        let context = context_text.to_lowercase();
        let allow = find_keyword(&context, &self.config.allow_keywords);
        let deny = find_keyword(&context, &self.config.deny_keywords);

        if !is_flat(value) {
            return match (deny, allow) {
                (Some(keyword), None) => Err(Rejection::DenyKeyword(keyword.to_string())),
                _ => Ok(()),
            };
        }

        if self.requires_decimals(source_url) {
            return Err(Rejection::DecimalsRequired);
        }
        if self.is_calendar_year(value, &context) {
            return Err(Rejection::CalendarYear);
        }
        if let Some(keyword) = deny {
            return Err(Rejection::DenyKeyword(keyword.to_string()));
        }
        if allow.is_none() {
            return Err(Rejection::FlatWithoutPriceContext);
        }
        Ok(())
    }

    fn requires_decimals(&self, source_url: &str) -> bool {
        if self.config.decimals_required_hosts.is_empty() {
            return false;
        }
        normalize_host(source_url).is_some_and(|host| {
            self.config
                .decimals_required_hosts
                .iter()
                .any(|pattern| host_matches(&host, pattern))
        })
    }

    fn is_calendar_year(&self, value: Decimal, context: &str) -> bool {
        let (min, max) = self.config.year_range;
        let in_range = value >= Decimal::from(min) && value <= Decimal::from(max);
        in_range && find_keyword(context, &self.config.year_keywords).is_some()
    }
}

/// First keyword present in `haystack` as a whole word (or phrase).
///
/// `haystack` must already be lowercase.
pub fn find_keyword<'a>(haystack: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .map(String::as_str)
        .find(|keyword| contains_word(haystack, keyword))
}

fn contains_word(haystack: &str, keyword: &str) -> bool {
    let keyword = keyword.to_lowercase();
    if keyword.is_empty() {
        return false;
    }
    haystack.match_indices(&keyword).any(|(start, _)| {
        let end = start + keyword.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Text within `window` characters on each side of `start..end`.
pub fn context_window(text: &str, start: usize, end: usize, window: usize) -> &str {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(window.saturating_sub(1))
        .map_or(0, |(i, _)| i);
    let to = text[end..]
        .char_indices()
        .nth(window)
        .map_or(text.len(), |(i, _)| end + i);
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    const URL: &str = "https://www.example-etf.com/fund";

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_non_flat_price_accepted() {
        let v = PlausibilityValidator::default();
        assert!(v.validate(d("23.15"), "Market Price as of 05/20/2025 $23.15", URL));
    }

    #[test]
    fn test_fund_size_rejected() {
        let v = PlausibilityValidator::default();
        assert_eq!(
            v.judge(d("1089"), "Fund Size EUR 1,089 m", URL),
            Err(Rejection::DenyKeyword("fund size".to_string()))
        );
    }

    #[test]
    fn test_flat_needs_price_context() {
        let v = PlausibilityValidator::default();
        assert_eq!(
            v.judge(d("24"), "Holdings 24", URL),
            Err(Rejection::FlatWithoutPriceContext)
        );
        assert!(v.validate(d("24"), "Closing price 24", URL));
    }

    #[test]
    fn test_calendar_year_rejected_even_near_price() {
        let v = PlausibilityValidator::default();
        assert_eq!(
            v.judge(d("2015"), "Share price history since launch 2015", URL),
            Err(Rejection::CalendarYear)
        );
    }

    #[test]
    fn test_dated_count_in_year_range_is_not_a_year() {
        let v = PlausibilityValidator::new(ValidatorConfig::for_share_counts());
        let text = "Shares Outstanding as of 05/20/2025 2,000";
        assert_eq!(v.judge(d("2000"), text, URL), Ok(()));
        assert_eq!(
            v.judge(d("2012"), "Shares outstanding since launch 2012", URL),
            Err(Rejection::CalendarYear)
        );
    }

    #[test]
    fn test_protection_level_rejected() {
        let v = PlausibilityValidator::default();
        assert!(!v.validate(d("90"), "Protection level 90", URL));
    }

    #[test]
    fn test_decimals_required_host() {
        let v = PlausibilityValidator::new(
            ValidatorConfig::default().require_decimals_for("strict-issuer.com"),
        );
        assert_eq!(
            v.judge(d("25"), "NAV 25", "https://fr.strict-issuer.com/etf"),
            Err(Rejection::DecimalsRequired)
        );
        assert!(v.validate(d("25.10"), "NAV 25.10", "https://fr.strict-issuer.com/etf"));
        assert!(v.validate(d("25"), "NAV 25", URL));
    }

    #[test]
    fn test_short_keywords_match_whole_words_only() {
        let v = PlausibilityValidator::default();
        // "ter" inside "quarter" must not count as the expense-ratio keyword
        assert!(v.validate(d("12"), "Quarter close price 12", URL));
        assert!(!v.validate(d("0.20"), "TER 0.20", URL));
    }

    #[test]
    fn test_non_flat_with_both_keywords_accepted() {
        let v = PlausibilityValidator::default();
        assert!(v.validate(d("23.15"), "NAV 23.15 Fund size 1,089m", URL));
    }

    #[test]
    fn test_context_window_respects_char_boundaries() {
        let text = "Prix € 23,15 – clôture";
        let start = text.find("23,15").unwrap();
        let end = start + "23,15".len();
        assert_eq!(context_window(text, start, end, 2), "€ 23,15 –");
        assert_eq!(context_window(text, start, end, 100), text);
    }

    proptest! {
        #[test]
        fn prop_fractional_without_deny_is_accepted(cents in 1i64..9_999_999i64) {
            prop_assume!(cents % 100 != 0);
            let v = PlausibilityValidator::default();
            let value = Decimal::new(cents, 2);
            let context = format!("... price {} ...", value);
            prop_assert!(v.validate(value, &context, URL));
        }

        #[test]
        fn prop_flat_near_deny_is_rejected(
            n in 1i64..100_000i64,
            fund_size in proptest::bool::ANY,
        ) {
            let v = PlausibilityValidator::default();
            let keyword = if fund_size { "Fund size" } else { "Protection level" };
            let context = format!("{} {}", keyword, n);
            prop_assert!(!v.validate(Decimal::from(n), &context, URL));
        }

        #[test]
        fn prop_out_of_range_is_rejected(
            n in 100_001i64..10_000_000i64,
            negative in proptest::bool::ANY,
        ) {
            let v = PlausibilityValidator::default();
            let value = if negative { Decimal::from(-n) } else { Decimal::from(n) };
            prop_assert!(!v.validate(value, "closing price NAV", URL));
            prop_assert!(!v.validate(Decimal::ZERO, "closing price NAV", URL));
        }
    }
}
