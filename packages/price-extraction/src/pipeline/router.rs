//! Domain router: URL → ordered strategy list.
//!
//! The route table is assembled once at start and read-only afterwards.
//! Every route is checked when the router is built: at most one custom
//! handler and it comes first, tiers never decrease, and no route carries
//! its own AI strategy (the AI tier is appended to every plan instead).

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{host_matches, normalize_host, normalize_path};
use crate::error::{RouteError, RouteResult};
use crate::pipeline::routes::RouteSpec;
use crate::strategies::{AiFallbackStrategy, LabelTextStrategy, LabelValidators, TableStrategy};
use crate::traits::{analyzer::PriceAnalyzer, strategy::ExtractionStrategy};
use crate::types::{config::ValidatorConfig, outcome::StrategyTier};

/// Route name used for the default strategy list.
pub const DEFAULT_ROUTE: &str = "default";

/// A host (and optional path prefix) bound to its own strategies.
#[derive(Clone)]
pub struct DomainRoute {
    name: String,
    host: String,
    path_prefix: String,
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    generic: bool,
}

impl DomainRoute {
    /// `host` may be a URL or a bare host; it is normalized like request URLs.
    pub fn new(
        name: impl Into<String>,
        host: &str,
        strategies: Vec<Arc<dyn ExtractionStrategy>>,
    ) -> Self {
        Self {
            name: name.into(),
            host: normalize_host(host).unwrap_or_default(),
            path_prefix: String::new(),
            strategies,
            generic: true,
        }
    }

    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim().trim_end_matches('/').to_lowercase();
        self.path_prefix = if prefix.is_empty() || prefix.starts_with('/') {
            prefix
        } else {
            format!("/{}", prefix)
        };
        self
    }

    /// Whether the generic strategies run after this route's own.
    pub fn with_generic(mut self, generic: bool) -> Self {
        self.generic = generic;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn strategies(&self) -> &[Arc<dyn ExtractionStrategy>] {
        &self.strategies
    }

    fn matches(&self, host: &str, path: &str) -> bool {
        host_matches(host, &self.host) && path_has_prefix(path, &self.path_prefix)
    }

    fn validate(&self) -> RouteResult<()> {
        if self.host.is_empty() {
            return Err(RouteError::EmptyHost {
                route: self.name.clone(),
            });
        }
        check_tiers(&self.name, &self.strategies)
    }
}

/// `/us/products` has prefix `/us` but not `/u`.
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn check_tiers(route: &str, strategies: &[Arc<dyn ExtractionStrategy>]) -> RouteResult<()> {
    let violation = |reason: String| RouteError::TierOrder {
        route: route.to_string(),
        reason,
    };

    let customs = strategies
        .iter()
        .filter(|s| s.tier() == StrategyTier::Custom)
        .count();
    if customs > 1 {
        return Err(violation(format!("{} custom handlers", customs)));
    }
    if let Some(ai) = strategies.iter().find(|s| s.tier() == StrategyTier::Ai) {
        return Err(violation(format!("AI strategy {} inside a route", ai.name())));
    }
    for pair in strategies.windows(2) {
        if pair[1].tier() < pair[0].tier() {
            return Err(violation(format!(
                "{} ({}) after {} ({})",
                pair[1].name(),
                pair[1].tier(),
                pair[0].name(),
                pair[0].tier()
            )));
        }
    }
    Ok(())
}

/// Strategies for one URL, in escalation order. Never empty.
#[derive(Clone)]
pub struct RoutePlan {
    route: String,
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
}

impl RoutePlan {
    /// Name of the matched route, or [`DEFAULT_ROUTE`].
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn strategies(&self) -> &[Arc<dyn ExtractionStrategy>] {
        &self.strategies
    }

    /// Strategies of one tier, in plan order.
    pub fn tier(&self, tier: StrategyTier) -> impl Iterator<Item = &Arc<dyn ExtractionStrategy>> {
        self.strategies.iter().filter(move |s| s.tier() == tier)
    }

    pub fn tiers(&self) -> Vec<StrategyTier> {
        self.strategies.iter().map(|s| s.tier()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

/// Maps URLs to strategy lists.
pub struct DomainRouter {
    routes: Vec<DomainRoute>,
    defaults: Vec<Arc<dyn ExtractionStrategy>>,
    ai: Option<Arc<dyn ExtractionStrategy>>,
}

impl DomainRouter {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Plan for `url`. The most specific route wins: longest host, then
    /// longest path prefix, then the route added first. Unmatched or
    /// unparseable URLs get the default list.
    pub fn route(&self, url: &str) -> RoutePlan {
        let matched = normalize_host(url).and_then(|host| {
            let path = normalize_path(url);
            // max_by_key keeps the last maximum, so scan back to front
            self.routes
                .iter()
                .rev()
                .filter(|r| r.matches(&host, &path))
                .max_by_key(|r| (r.host.len(), r.path_prefix.len()))
        });

        let mut strategies = Vec::new();
        let route = match matched {
            Some(route) => {
                strategies.extend(route.strategies.iter().cloned());
                if route.generic || strategies.is_empty() {
                    strategies.extend(self.defaults.iter().cloned());
                }
                route.name.clone()
            }
            None => {
                strategies.extend(self.defaults.iter().cloned());
                DEFAULT_ROUTE.to_string()
            }
        };
        if let Some(ai) = &self.ai {
            strategies.push(Arc::clone(ai));
        }

        debug!(url = %url, route = %route, strategies = strategies.len(), "routed");
        RoutePlan { route, strategies }
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Whether plans end with an AI strategy.
    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }
}

/// Route table entry, compiled at build time so the validator config applies.
enum RouteEntry {
    Spec(RouteSpec),
    Assembled(DomainRoute),
}

/// Builder for [`DomainRouter`].
///
/// Routes keep the order they were added in; among equally specific
/// matches the earlier one wins.
///
/// # Example
///
/// ```rust,ignore
/// let router = DomainRouter::builder()
///     .with_builtin_catalog()
///     .with_specs(load_route_file("routes.json")?)
///     .with_analyzer(Arc::new(OpenAiAnalyzer::from_env()?))
///     .build()?;
/// ```
pub struct RouterBuilder {
    validator: ValidatorConfig,
    entries: Vec<RouteEntry>,
    defaults: Option<Vec<Arc<dyn ExtractionStrategy>>>,
    ai: Option<Arc<dyn ExtractionStrategy>>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            validator: ValidatorConfig::default(),
            entries: Vec::new(),
            defaults: None,
            ai: None,
        }
    }

    /// Base validator config for routes and the default strategies.
    pub fn with_validator(mut self, config: ValidatorConfig) -> Self {
        self.validator = config;
        self
    }

    pub fn with_builtin_catalog(self) -> Self {
        self.with_specs(crate::pipeline::routes::builtin_routes())
    }

    pub fn with_spec(mut self, spec: RouteSpec) -> Self {
        self.entries.push(RouteEntry::Spec(spec));
        self
    }

    pub fn with_specs(mut self, specs: impl IntoIterator<Item = RouteSpec>) -> Self {
        self.entries.extend(specs.into_iter().map(RouteEntry::Spec));
        self
    }

    /// Add an already-assembled route.
    pub fn with_route(mut self, route: DomainRoute) -> Self {
        self.entries.push(RouteEntry::Assembled(route));
        self
    }

    /// Replace the generic table + text default list.
    pub fn with_default_strategies(
        mut self,
        strategies: Vec<Arc<dyn ExtractionStrategy>>,
    ) -> Self {
        self.defaults = Some(strategies);
        self
    }

    /// Append the AI fallback backed by `analyzer` to every plan.
    pub fn with_analyzer(self, analyzer: Arc<dyn PriceAnalyzer>) -> Self {
        let validators = LabelValidators::new(self.validator.clone());
        self.with_ai_strategy(Arc::new(
            AiFallbackStrategy::new(analyzer).with_validators(validators),
        ))
    }

    pub fn with_ai_strategy(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.ai = Some(strategy);
        self
    }

    pub fn build(self) -> RouteResult<DomainRouter> {
        let mut routes = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            routes.push(match entry {
                RouteEntry::Spec(spec) => spec.compile(&self.validator)?,
                RouteEntry::Assembled(route) => route,
            });
        }
        for route in &routes {
            route.validate()?;
        }

        let defaults: Vec<Arc<dyn ExtractionStrategy>> = match self.defaults {
            Some(defaults) => defaults,
            None => {
                let validators = LabelValidators::new(self.validator.clone());
                vec![
                    Arc::new(TableStrategy::new(validators.clone())),
                    Arc::new(LabelTextStrategy::new(validators)),
                ]
            }
        };
        if defaults.is_empty() {
            return Err(RouteError::TierOrder {
                route: DEFAULT_ROUTE.to_string(),
                reason: "no default strategies".to_string(),
            });
        }
        check_tiers(DEFAULT_ROUTE, &defaults)?;

        if let Some(ai) = &self.ai {
            if ai.tier() != StrategyTier::Ai {
                return Err(RouteError::TierOrder {
                    route: DEFAULT_ROUTE.to_string(),
                    reason: format!("fallback {} is not an AI strategy", ai.name()),
                });
            }
        }

        info!(
            routes = routes.len(),
            defaults = defaults.len(),
            ai = self.ai.is_some(),
            "domain router built"
        );
        Ok(DomainRouter {
            routes,
            defaults,
            ai: self.ai,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStrategy;
    use crate::types::outcome::ExtractionOutcome;

    fn scripted(name: &str, tier: StrategyTier) -> Arc<dyn ExtractionStrategy> {
        Arc::new(ScriptedStrategy::new(name, tier, ExtractionOutcome::not_found("scripted")))
    }

    fn router() -> DomainRouter {
        DomainRouter::builder()
            .with_route(DomainRoute::new(
                "issuer",
                "issuer.example",
                vec![scripted("issuer", StrategyTier::Custom)],
            ))
            .with_route(
                DomainRoute::new(
                    "issuer-notes",
                    "issuer.example",
                    vec![
                        scripted("notes", StrategyTier::Custom),
                        scripted("notes-api", StrategyTier::Api),
                    ],
                )
                .with_path_prefix("/notes"),
            )
            .with_route(
                DomainRoute::new(
                    "eu",
                    "eu.issuer.example",
                    vec![scripted("eu", StrategyTier::Custom)],
                )
                .with_generic(false),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_unmatched_url_gets_defaults() {
        let plan = router().route("https://unknown.example/fund");
        assert_eq!(plan.route(), DEFAULT_ROUTE);
        assert_eq!(plan.names(), vec!["generic-table", "generic-text"]);
    }

    #[test]
    fn test_unparseable_url_gets_defaults() {
        let plan = router().route("::::");
        assert_eq!(plan.route(), DEFAULT_ROUTE);
        assert!(!plan.strategies().is_empty());
    }

    #[test]
    fn test_host_normalization_and_subdomains() {
        let r = router();
        assert_eq!(r.route("HTTPS://WWW.Issuer.Example/fund/").route(), "issuer");
        assert_eq!(r.route("https://us.issuer.example/fund").route(), "issuer");
        assert_eq!(r.route("https://notissuer.example/fund").route(), DEFAULT_ROUTE);
    }

    #[test]
    fn test_most_specific_route_wins() {
        let r = router();
        let notes = r.route("https://issuer.example/notes/abc");
        assert_eq!(notes.route(), "issuer-notes");
        assert_eq!(
            notes.tiers(),
            vec![
                StrategyTier::Custom,
                StrategyTier::Api,
                StrategyTier::Generic,
                StrategyTier::Generic
            ]
        );

        assert_eq!(r.route("https://issuer.example/notesx").route(), "issuer");
        assert_eq!(r.route("https://eu.issuer.example/notes/abc").route(), "eu");
    }

    #[test]
    fn test_equally_specific_routes_first_added_wins() {
        let r = DomainRouter::builder()
            .with_spec(RouteSpec::new("user-etn", "etn.example.com"))
            .with_route(DomainRoute::new(
                "catalog-etn",
                "https://www.etn.example.com",
                vec![scripted("catalog", StrategyTier::Custom)],
            ))
            .build()
            .unwrap();
        assert_eq!(r.route("https://etn.example.com/notes/abc").route(), "user-etn");

        let reversed = DomainRouter::builder()
            .with_route(DomainRoute::new(
                "catalog-etn",
                "etn.example.com",
                vec![scripted("catalog", StrategyTier::Custom)],
            ))
            .with_spec(RouteSpec::new("user-etn", "etn.example.com"))
            .build()
            .unwrap();
        assert_eq!(
            reversed.route("https://etn.example.com/notes/abc").route(),
            "catalog-etn"
        );
    }

    #[test]
    fn test_route_without_generic() {
        let plan = router().route("https://eu.issuer.example/fund");
        assert_eq!(plan.names(), vec!["eu"]);
    }

    #[test]
    fn test_ai_appended_last() {
        let r = DomainRouter::builder()
            .with_ai_strategy(scripted("ai", StrategyTier::Ai))
            .build()
            .unwrap();
        let plan = r.route("https://unknown.example/");
        assert_eq!(plan.tiers().last(), Some(&StrategyTier::Ai));
        assert!(r.has_ai());
    }

    #[test]
    fn test_tier_invariants_enforced() {
        let two_custom = DomainRouter::builder()
            .with_route(DomainRoute::new(
                "r",
                "a.example",
                vec![
                    scripted("a", StrategyTier::Custom),
                    scripted("b", StrategyTier::Custom),
                ],
            ))
            .build();
        assert!(matches!(two_custom, Err(RouteError::TierOrder { .. })));

        let custom_after_generic = DomainRouter::builder()
            .with_route(DomainRoute::new(
                "r",
                "a.example",
                vec![
                    scripted("g", StrategyTier::Generic),
                    scripted("c", StrategyTier::Custom),
                ],
            ))
            .build();
        assert!(matches!(custom_after_generic, Err(RouteError::TierOrder { .. })));

        let ai_in_route = DomainRouter::builder()
            .with_route(DomainRoute::new(
                "r",
                "a.example",
                vec![scripted("ai", StrategyTier::Ai)],
            ))
            .build();
        assert!(matches!(ai_in_route, Err(RouteError::TierOrder { .. })));

        let empty_host = DomainRouter::builder()
            .with_route(DomainRoute::new("r", "", vec![]))
            .build();
        assert!(matches!(empty_host, Err(RouteError::EmptyHost { .. })));

        let no_defaults = DomainRouter::builder().with_default_strategies(vec![]).build();
        assert!(matches!(no_defaults, Err(RouteError::TierOrder { .. })));
    }

    #[test]
    fn test_builtin_catalog_routes() {
        let r = DomainRouter::builder().with_builtin_catalog().build().unwrap();
        assert!(!r.is_empty());
        let plan = r.route("https://www.ishares.com/us/products/239726/");
        assert_eq!(plan.route(), "ishares");
        assert_eq!(plan.tiers()[0], StrategyTier::Custom);
    }
}
