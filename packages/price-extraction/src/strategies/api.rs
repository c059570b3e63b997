//! JSON endpoint lookup.
//!
//! Some issuers render prices client-side from a quote endpoint keyed by an
//! identifier in the product URL (ISIN, ticker, fund id). Reading the
//! endpoint directly is cheaper and more exact than scraping the page.

use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

use crate::error::{RouteError, RouteResult};
use crate::pipeline::session::PageAccess;
use crate::traits::strategy::ExtractionStrategy;
use crate::types::{
    outcome::{ExtractionOutcome, FailureKind, StrategyTier},
    request::{is_share_count_label, ExtractionRequest},
};
use crate::validation::{parse_number, NumberFormat, PlausibilityValidator};

/// Declarative description of an API lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSpec {
    /// Regex over the request URL; its captures feed `endpoint`
    pub url_pattern: String,

    /// Endpoint template, `$1` / `${name}` expanded from `url_pattern`
    pub endpoint: String,

    /// JSON pointer to the value (RFC 6901, e.g. `/data/nav`)
    pub pointer: String,

    /// Label reported for the value
    pub label: String,
}

/// Strategy reading one value from a JSON endpoint.
pub struct ApiLookupStrategy {
    name: String,
    url_pattern: Regex,
    endpoint: String,
    pointer: String,
    label: String,
    validator: PlausibilityValidator,
}

impl ApiLookupStrategy {
    pub fn from_spec(
        name: impl Into<String>,
        spec: &ApiSpec,
        validator: PlausibilityValidator,
    ) -> RouteResult<Self> {
        let name = name.into();
        let url_pattern =
            Regex::new(&spec.url_pattern).map_err(|source| RouteError::InvalidPattern {
                route: name.clone(),
                pattern: spec.url_pattern.clone(),
                source,
            })?;

        Ok(Self {
            name,
            url_pattern,
            endpoint: spec.endpoint.clone(),
            pointer: spec.pointer.clone(),
            label: spec.label.to_lowercase(),
            validator,
        })
    }

    /// Endpoint for `url`, or `None` when the URL carries no identifier.
    pub fn endpoint_for(&self, url: &str) -> Option<String> {
        let caps = self.url_pattern.captures(url)?;
        let mut endpoint = String::new();
        caps.expand(&self.endpoint, &mut endpoint);
        Some(endpoint)
    }

    /// Read the value out of a JSON body.
    pub fn read_body(&self, body: &str, endpoint: &str) -> ExtractionOutcome {
        let json: Value = match serde_json::from_str(body.trim()) {
            Ok(json) => json,
            Err(e) => {
                return ExtractionOutcome::failure(
                    FailureKind::InvalidInput,
                    format!("{}: response is not JSON: {}", self.name, e),
                )
            }
        };

        let value = match json.pointer(&self.pointer) {
            Some(Value::Null) | None => {
                return ExtractionOutcome::not_found(format!(
                    "{}: nothing at {}",
                    self.name, self.pointer
                ))
            }
            Some(found) => json_number(found),
        };

        let Some(value) = value else {
            return ExtractionOutcome::failure(
                FailureKind::InvalidInput,
                format!("{}: value at {} is not numeric", self.name, self.pointer),
            );
        };

        let context = format!("{} {}", self.label, self.pointer.replace('/', " "));
        if !self.validator.validate(value, &context, endpoint) {
            return ExtractionOutcome::not_found(format!(
                "{}: {} at {} failed plausibility",
                self.name, value, self.pointer
            ));
        }

        debug!(strategy = %self.name, endpoint = %endpoint, %value, "API value read");
        ExtractionOutcome::success(value, self.label.as_str())
    }
}

/// Numbers are read exactly; strings go through the page-text parser.
fn json_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let literal = n.to_string();
            Decimal::from_str(&literal)
                .or_else(|_| Decimal::from_scientific(&literal))
                .ok()
        }
        Value::String(s) => parse_number(s, NumberFormat::Auto).ok(),
        _ => None,
    }
}

#[async_trait]
impl ExtractionStrategy for ApiLookupStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn tier(&self) -> StrategyTier {
        StrategyTier::Api
    }

    async fn attempt(
        &self,
        request: &ExtractionRequest,
        page: &mut PageAccess<'_>,
    ) -> ExtractionOutcome {
        if is_share_count_label(&self.label) != request.wants_share_count() {
            return ExtractionOutcome::not_found(format!(
                "{}: reads {}, request wants {}",
                self.name,
                self.label,
                request.primary_label()
            ));
        }

        let Some(endpoint) = self.endpoint_for(&request.url) else {
            return ExtractionOutcome::not_found(format!(
                "{}: no identifier in {}",
                self.name, request.url
            ));
        };

        match page.load(&endpoint).await {
            Ok(snapshot) => self.read_body(&snapshot.html, &endpoint),
            Err(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBrowser;
    use std::time::Duration;

    fn strategy() -> ApiLookupStrategy {
        ApiLookupStrategy::from_spec(
            "quote-api",
            &ApiSpec {
                url_pattern: r"/products/(?P<isin>[A-Z]{2}[A-Z0-9]{10})".to_string(),
                endpoint: "https://api.issuer.example/quotes/${isin}.json".to_string(),
                pointer: "/data/nav".to_string(),
                label: "NAV".to_string(),
            },
            PlausibilityValidator::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_expansion() {
        let s = strategy();
        assert_eq!(
            s.endpoint_for("https://issuer.example/products/IE00B4L5Y983/overview"),
            Some("https://api.issuer.example/quotes/IE00B4L5Y983.json".to_string())
        );
        assert_eq!(s.endpoint_for("https://issuer.example/about"), None);
    }

    #[test]
    fn test_read_body() {
        let s = strategy();
        let ep = "https://api.issuer.example/quotes/x.json";

        assert_eq!(
            s.read_body(r#"{"data":{"nav":41.27}}"#, ep),
            ExtractionOutcome::success(Decimal::new(4127, 2), "nav")
        );
        assert_eq!(
            s.read_body(r#"{"data":{"nav":"1'041.27"}}"#, ep).value(),
            Some(Decimal::new(104127, 2))
        );
        assert_eq!(
            s.read_body(r#"{"data":{}}"#, ep).failure_kind(),
            Some(FailureKind::NotFound)
        );
        assert_eq!(
            s.read_body("<html>blocked</html>", ep).failure_kind(),
            Some(FailureKind::InvalidInput)
        );
        assert_eq!(
            s.read_body(r#"{"data":{"nav":-3.5}}"#, ep).failure_kind(),
            Some(FailureKind::NotFound)
        );
    }

    #[test]
    fn test_bad_url_pattern() {
        let err = ApiLookupStrategy::from_spec(
            "broken",
            &ApiSpec {
                url_pattern: "(".to_string(),
                endpoint: String::new(),
                pointer: String::new(),
                label: "nav".to_string(),
            },
            PlausibilityValidator::default(),
        )
        .err();
        assert!(matches!(err, Some(RouteError::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn test_attempt_loads_endpoint() {
        let endpoint = "https://api.issuer.example/quotes/IE00B4L5Y983.json";
        let mut browser = MockBrowser::new().with_html_page(endpoint, r#"{"data":{"nav":98.10}}"#);
        let observer = browser.clone();
        let mut page = PageAccess::new(&mut browser, Duration::from_secs(1));

        let request = ExtractionRequest::new("https://issuer.example/products/IE00B4L5Y983");
        let outcome = strategy().attempt(&request, &mut page).await;

        assert_eq!(outcome.value(), Some(Decimal::new(9810, 2)));
        assert_eq!(observer.navigations(), vec![endpoint]);
    }

    #[tokio::test]
    async fn test_price_lookup_ignores_count_requests() {
        let endpoint = "https://api.issuer.example/quotes/IE00B4L5Y983.json";
        let mut browser = MockBrowser::new().with_html_page(endpoint, r#"{"data":{"nav":41.27}}"#);
        let observer = browser.clone();
        let mut page = PageAccess::new(&mut browser, Duration::from_secs(1));

        let request = ExtractionRequest::new("https://issuer.example/products/IE00B4L5Y983")
            .with_labels(["shares outstanding"]);
        let outcome = strategy().attempt(&request, &mut page).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::NotFound));
        assert!(observer.navigations().is_empty());
    }
}
