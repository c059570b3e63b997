//! Route specifications: per-site handlers as data.
//!
//! A route is a host (plus optional path prefix) with an ordered pattern
//! list, optional API lookups and validator overrides. Routes come from the
//! built-in catalog and from JSON files:
//!
//! ```json
//! [
//!   {
//!     "name": "example-etn",
//!     "host": "etn.example.com",
//!     "patterns": [
//!       { "regex": "(?i)notes outstanding\\s*([\\d,.]+)", "label": "notes outstanding" }
//!     ],
//!     "validator": { "decimals_required": true }
//!   }
//! ]
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::normalize_host;
use crate::error::{ExtractionError, Result, RouteError, RouteResult};
use crate::pipeline::router::DomainRoute;
use crate::strategies::{
    ApiLookupStrategy, ApiSpec, LabelValidators, PatternStrategy, PricePattern,
};
use crate::traits::strategy::ExtractionStrategy;
use crate::types::config::ValidatorConfig;
use crate::validation::NumberFormat;

fn default_true() -> bool {
    true
}

/// One regex in a route's pattern list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// Regex with one capture group around the number
    pub regex: String,

    /// Label reported for the value
    pub label: String,

    /// Smallest accepted value (decimal literal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,

    /// Largest accepted value (decimal literal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require_nearby: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbid_nearby: Vec<String>,

    #[serde(default)]
    pub format: NumberFormat,
}

impl PatternSpec {
    pub fn new(regex: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            label: label.into(),
            min: None,
            max: None,
            require_nearby: Vec::new(),
            forbid_nearby: Vec::new(),
            format: NumberFormat::Auto,
        }
    }

    pub fn with_range(mut self, min: &str, max: &str) -> Self {
        self.min = Some(min.to_string());
        self.max = Some(max.to_string());
        self
    }

    pub fn currency(mut self) -> Self {
        self.format = NumberFormat::Currency;
        self
    }

    fn compile(&self, route: &str) -> RouteResult<PricePattern> {
        let min = parse_literal(route, self.min.as_deref())?.unwrap_or(Decimal::ZERO);
        let max = parse_literal(route, self.max.as_deref())?.unwrap_or(Decimal::MAX);

        Ok(PricePattern::compile(route, &self.regex, &self.label)?
            .with_range(min, max)
            .require_nearby(self.require_nearby.iter().cloned())
            .forbid_nearby(self.forbid_nearby.iter().cloned())
            .with_format(self.format))
    }
}

fn parse_literal(route: &str, literal: Option<&str>) -> RouteResult<Option<Decimal>> {
    literal
        .map(|value| {
            Decimal::from_str(value.trim()).map_err(|_| RouteError::InvalidNumber {
                route: route.to_string(),
                value: value.to_string(),
            })
        })
        .transpose()
}

/// Per-route adjustments to the shared validator config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorOverrides {
    /// Price ceiling (decimal literal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,

    /// The host always publishes decimals; whole numbers are noise
    #[serde(default)]
    pub decimals_required: bool,
}

/// Declarative route entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub name: String,

    /// Host, with or without scheme and `www.`
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,

    /// Custom handler patterns, in preference order
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,

    /// API lookups tried after the custom handler
    #[serde(default)]
    pub api: Vec<ApiSpec>,

    /// Append the generic strategies after this route's own
    #[serde(default = "default_true")]
    pub generic: bool,

    #[serde(default)]
    pub validator: ValidatorOverrides,
}

impl RouteSpec {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            path_prefix: None,
            patterns: Vec::new(),
            api: Vec::new(),
            generic: true,
            validator: ValidatorOverrides::default(),
        }
    }

    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    pub fn with_pattern(mut self, pattern: PatternSpec) -> Self {
        self.patterns.push(pattern);
        self
    }

    pub fn with_api(mut self, api: ApiSpec) -> Self {
        self.api.push(api);
        self
    }

    /// Validator config for this route on top of `base`.
    pub fn validator_config(&self, base: &ValidatorConfig) -> RouteResult<ValidatorConfig> {
        let mut config = base
            .clone()
            .allow(self.validator.allow.iter().cloned())
            .deny(self.validator.deny.iter().cloned());

        if let Some(ceiling) = parse_literal(&self.name, self.validator.ceiling.as_deref())? {
            config = config.with_ceiling(ceiling);
        }
        if self.validator.decimals_required {
            let host = normalize_host(&self.host).ok_or_else(|| RouteError::EmptyHost {
                route: self.name.clone(),
            })?;
            config = config.require_decimals_for(host);
        }
        Ok(config)
    }

    /// Compile into a route: one custom handler (if any patterns) followed by
    /// the API lookups.
    pub fn compile(&self, base: &ValidatorConfig) -> RouteResult<DomainRoute> {
        let config = self.validator_config(base)?;
        let validators = LabelValidators::new(config);
        let mut strategies: Vec<Arc<dyn ExtractionStrategy>> = Vec::new();

        if !self.patterns.is_empty() {
            let patterns = self
                .patterns
                .iter()
                .map(|p| p.compile(&self.name))
                .collect::<RouteResult<Vec<_>>>()?;
            strategies.push(Arc::new(PatternStrategy::custom(
                self.name.clone(),
                patterns,
                validators.clone(),
            )));
        }

        for (i, api) in self.api.iter().enumerate() {
            let name = if self.api.len() == 1 {
                format!("{}-api", self.name)
            } else {
                format!("{}-api-{}", self.name, i + 1)
            };
            let validator = validators.for_label(&api.label).clone();
            strategies.push(Arc::new(ApiLookupStrategy::from_spec(name, api, validator)?));
        }

        let mut route = DomainRoute::new(self.name.clone(), &self.host, strategies)
            .with_generic(self.generic);
        if let Some(prefix) = &self.path_prefix {
            route = route.with_path_prefix(prefix);
        }
        Ok(route)
    }
}

/// Read a JSON array of routes.
pub fn load_route_file(path: impl AsRef<Path>) -> Result<Vec<RouteSpec>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ExtractionError::Config(Box::new(e)))?;
    let routes: Vec<RouteSpec> = serde_json::from_str(&raw)?;
    Ok(routes)
}

/// Built-in issuer routes.
///
/// Only a handful of well-known layouts; deployments add their own through
/// route files.
pub fn builtin_routes() -> Vec<RouteSpec> {
    vec![
        RouteSpec::new("ishares", "ishares.com")
            .with_pattern(
                PatternSpec::new(
                    r"(?i)closing price\s*(?:as of [a-z]{3} \d{1,2}, \d{4})?\s*(?:usd|eur|gbp|\$|€|£)?\s*([\d.,]+)",
                    "closing price",
                )
                .currency(),
            )
            .with_pattern(
                PatternSpec::new(
                    r"(?i)\bnav\b\s*(?:as of [a-z]{3} \d{1,2}, \d{4})?\s*(?:usd|eur|gbp|\$|€|£)?\s*([\d.,]+)",
                    "nav",
                )
                .currency(),
            )
            .with_pattern(PatternSpec::new(
                r"(?i)shares outstanding\s*(?:as of [a-z]{3} \d{1,2}, \d{4})?\s*([\d.,]+)",
                "shares outstanding",
            )),
        RouteSpec::new("ipath", "ipathetn.com")
            .with_pattern(
                PatternSpec::new(
                    r"(?i)closing indicative note value\s*\$?\s*([\d.,]+)",
                    "closing price",
                )
                .currency(),
            )
            .with_pattern(PatternSpec::new(
                r"(?i)notes outstanding\s*([\d.,]+)",
                "notes outstanding",
            )),
        RouteSpec::new("xtrackers", "etf.dws.com").with_pattern(
            PatternSpec::new(r"(?i)\bnav\b\s*(?:eur|usd|gbp)?\s*([\d.,]+)", "nav")
                .with_range("0.01", "10000"),
        ),
        RouteSpec::new("wisdomtree", "wisdomtree.eu")
            .with_pattern(
                PatternSpec::new(
                    r"(?i)market price\s*(?:usd|eur|gbp|\$|€|£)?\s*([\d.,]+)",
                    "market price",
                )
                .currency(),
            )
            .with_pattern(PatternSpec::new(
                r"(?i)(?:securities|units|shares) in issue\s*([\d.,]+)",
                "shares outstanding",
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::session::PageAccess;
    use crate::testing::MockBrowser;
    use crate::types::outcome::{ExtractionOutcome, FailureKind, StrategyTier};
    use crate::types::request::ExtractionRequest;
    use std::time::Duration;

    /// Run the route's custom handler against one page of text.
    async fn custom_handler(
        spec: &RouteSpec,
        url: &str,
        text: &str,
        label: &str,
    ) -> ExtractionOutcome {
        let route = spec.compile(&ValidatorConfig::default()).unwrap();
        let mut browser = MockBrowser::new().with_text_page(url, text);
        let mut page = PageAccess::new(&mut browser, Duration::from_secs(1));
        let request = ExtractionRequest::new(url).with_labels([label]);
        route.strategies()[0].attempt(&request, &mut page).await
    }

    fn builtin(name: &str) -> RouteSpec {
        builtin_routes()
            .into_iter()
            .find(|spec| spec.name == name)
            .unwrap()
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_builtin_catalog_compiles() {
        let base = ValidatorConfig::default();
        for spec in builtin_routes() {
            let route = spec.compile(&base).unwrap();
            assert_eq!(route.strategies()[0].tier(), StrategyTier::Custom);
        }
    }

    #[tokio::test]
    async fn test_builtin_patterns_read_issuer_layouts() {
        let cases = [
            (
                "ishares",
                "https://www.ishares.com/us/products/239726/",
                "Closing Price as of May 20, 2025 USD 542.18",
                "closing price",
                "542.18",
            ),
            (
                "ishares",
                "https://www.ishares.com/us/products/239726/",
                "NAV as of May 20, 2025 $541.90",
                "nav",
                "541.90",
            ),
            (
                "ishares",
                "https://www.ishares.com/us/products/239726/",
                "Shares Outstanding as of May 20, 2025 1,012,450,000",
                "shares outstanding",
                "1012450000",
            ),
            (
                "ipath",
                "https://www.ipathetn.com/US/16/en/details.app?instrumentId=1",
                "Closing Indicative Note Value $41.72",
                "closing price",
                "41.72",
            ),
            (
                "ipath",
                "https://www.ipathetn.com/US/16/en/details.app?instrumentId=1",
                "Notes Outstanding 5,853,000",
                "notes outstanding",
                "5853000",
            ),
            (
                "xtrackers",
                "https://etf.dws.com/en-gb/LU0274211480/",
                "NAV EUR 98.41",
                "nav",
                "98.41",
            ),
            (
                "wisdomtree",
                "https://www.wisdomtree.eu/en-gb/etps/commodities/wisdomtree-gold",
                "Market Price USD 12.34",
                "market price",
                "12.34",
            ),
            (
                "wisdomtree",
                "https://www.wisdomtree.eu/en-gb/etps/commodities/wisdomtree-gold",
                "Securities in Issue 1,250,000",
                "shares outstanding",
                "1250000",
            ),
        ];

        for (name, url, text, label, expected) in cases {
            let outcome = custom_handler(&builtin(name), url, text, label).await;
            assert_eq!(outcome.value(), Some(d(expected)), "{name}: {text}");
        }
    }

    #[tokio::test]
    async fn test_decimals_required_route_still_reads_counts() {
        let spec = RouteSpec::new("example-etn", "etn.example.com")
            .with_pattern(PatternSpec::new(
                r"(?i)notes outstanding\s*([\d.,]+)",
                "notes outstanding",
            ))
            .with_pattern(PatternSpec::new(r"(?i)closing price\s*([\d.,]+)", "closing price"));
        let spec = RouteSpec {
            validator: ValidatorOverrides {
                decimals_required: true,
                ..Default::default()
            },
            ..spec
        };
        let url = "https://etn.example.com/notes/ABC";
        let text = "Closing Price 41 Notes Outstanding 5,853,000";

        let count = custom_handler(&spec, url, text, "notes outstanding").await;
        assert_eq!(count.value(), Some(d("5853000")));

        let price = custom_handler(&spec, url, text, "closing price").await;
        assert_eq!(price.failure_kind(), Some(FailureKind::NotFound));
    }

    #[test]
    fn test_route_file_format() {
        let json = r#"[
            {
                "name": "example-etn",
                "host": "https://www.ETN.example.com/",
                "path_prefix": "/notes",
                "patterns": [
                    { "regex": "(?i)notes outstanding\\s*([\\d,.]+)", "label": "notes outstanding" },
                    {
                        "regex": "(?i)price\\s*([\\d,.]+)", "label": "price",
                        "min": "1", "max": "500", "format": "currency"
                    }
                ],
                "api": [
                    {
                        "url_pattern": "/notes/(\\w+)", "endpoint": "https://api.example.com/$1",
                        "pointer": "/price", "label": "price"
                    }
                ],
                "validator": { "ceiling": "5000", "decimals_required": true }
            }
        ]"#;

        let specs: Vec<RouteSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs[0].patterns[1].format, NumberFormat::Currency);
        assert!(specs[0].generic);

        let config = specs[0].validator_config(&ValidatorConfig::default()).unwrap();
        assert_eq!(config.ceiling, Decimal::from(5000));
        assert_eq!(config.decimals_required_hosts, vec!["etn.example.com"]);

        let route = specs[0].compile(&ValidatorConfig::default()).unwrap();
        let tiers: Vec<_> = route.strategies().iter().map(|s| s.tier()).collect();
        assert_eq!(tiers, vec![StrategyTier::Custom, StrategyTier::Api]);
    }

    #[test]
    fn test_invalid_literals_and_patterns() {
        let bad_number = RouteSpec::new("r", "example.com")
            .with_pattern(PatternSpec::new(r"price (\d+)", "price").with_range("one", "10"));
        assert!(matches!(
            bad_number.compile(&ValidatorConfig::default()),
            Err(RouteError::InvalidNumber { .. })
        ));

        let no_group = RouteSpec::new("r", "example.com")
            .with_pattern(PatternSpec::new(r"price \d+", "price"));
        assert!(matches!(
            no_group.compile(&ValidatorConfig::default()),
            Err(RouteError::MissingCapture { .. })
        ));
    }
}
