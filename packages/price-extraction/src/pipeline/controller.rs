//! Fallback escalation controller.
//!
//! Runs a route plan tier by tier: custom handlers, API lookups, generic
//! scraping, then (when allowed) the AI tier. The first success
//! short-circuits everything after it. Misses are data, so a failing
//! strategy only ever moves the controller forward.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::pipeline::router::{DomainRouter, RoutePlan};
use crate::pipeline::session::PageAccess;
use crate::traits::browser::Browser;
use crate::types::{
    config::PipelineConfig,
    outcome::{ExtractionOutcome, FailureKind, StrategyTier},
    request::ExtractionRequest,
};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    NotStarted,
    TryingCustomTier,
    TryingApiTier,
    TryingGenericTier,
    TryingAiTier,
    Succeeded,
    ExhaustedFailed,
}

impl EscalationState {
    /// State for working through `tier`.
    pub fn trying(tier: StrategyTier) -> Self {
        match tier {
            StrategyTier::Custom => EscalationState::TryingCustomTier,
            StrategyTier::Api => EscalationState::TryingApiTier,
            StrategyTier::Generic => EscalationState::TryingGenericTier,
            StrategyTier::Ai => EscalationState::TryingAiTier,
        }
    }
}

impl fmt::Display for EscalationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EscalationState::NotStarted => "not_started",
            EscalationState::TryingCustomTier => "trying_custom_tier",
            EscalationState::TryingApiTier => "trying_api_tier",
            EscalationState::TryingGenericTier => "trying_generic_tier",
            EscalationState::TryingAiTier => "trying_ai_tier",
            EscalationState::Succeeded => "succeeded",
            EscalationState::ExhaustedFailed => "exhausted_failed",
        };
        f.write_str(s)
    }
}

/// One failed strategy attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub strategy: String,
    pub tier: StrategyTier,
    pub kind: FailureKind,
    pub detail: String,
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {} ({})", self.tier, self.strategy, self.kind, self.detail)
    }
}

/// Terminal result of escalating one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Resolution {
    Succeeded {
        #[serde(with = "rust_decimal::serde::float")]
        value: Decimal,
        label: String,
        strategy: String,
        tier: StrategyTier,
    },
    Exhausted {
        attempts: Vec<AttemptRecord>,
    },
}

impl Resolution {
    pub fn is_success(&self) -> bool {
        matches!(self, Resolution::Succeeded { .. })
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Resolution::Succeeded { value, .. } => Some(*value),
            Resolution::Exhausted { .. } => None,
        }
    }

    /// Attempts that failed before the terminal state (empty on success).
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            Resolution::Succeeded { .. } => &[],
            Resolution::Exhausted { attempts } => attempts,
        }
    }

    /// Human-readable account of the tiers tried and why each failed.
    pub fn diagnostic(&self) -> String {
        match self {
            Resolution::Succeeded {
                value,
                strategy,
                tier,
                ..
            } => format!("{} from {}/{}", value, tier, strategy),
            Resolution::Exhausted { attempts } if attempts.is_empty() => {
                format!("{}: no strategy ran", FailureKind::ExhaustedAllTiers)
            }
            Resolution::Exhausted { attempts } => {
                let tried: Vec<String> = attempts.iter().map(ToString::to_string).collect();
                format!("{}: {}", FailureKind::ExhaustedAllTiers, tried.join("; "))
            }
        }
    }

    /// Collapse to a single outcome.
    pub fn outcome(&self) -> ExtractionOutcome {
        match self {
            Resolution::Succeeded { value, label, .. } => {
                ExtractionOutcome::success(*value, label.as_str())
            }
            Resolution::Exhausted { .. } => {
                ExtractionOutcome::failure(FailureKind::ExhaustedAllTiers, self.diagnostic())
            }
        }
    }
}

/// Drives route plans to a [`Resolution`].
pub struct EscalationController {
    router: Arc<DomainRouter>,
    config: PipelineConfig,
}

impl EscalationController {
    pub fn new(router: Arc<DomainRouter>, config: PipelineConfig) -> Self {
        Self { router, config }
    }

    pub fn router(&self) -> &DomainRouter {
        &self.router
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Route `request` and escalate through its plan on `browser`.
    pub async fn resolve(
        &self,
        browser: &mut dyn Browser,
        request: &ExtractionRequest,
    ) -> Resolution {
        let plan = self.router.route(&request.url);
        let mut page = PageAccess::new(browser, self.config.load_timeout());
        self.run_plan(&plan, request, &mut page).await
    }

    /// Escalate through an already-routed plan.
    pub async fn run_plan(
        &self,
        plan: &RoutePlan,
        request: &ExtractionRequest,
        page: &mut PageAccess<'_>,
    ) -> Resolution {
        let ai_allowed = self.config.ai_fallback && request.ai_fallback;
        let mut state = EscalationState::NotStarted;
        let mut attempts = Vec::new();

        'tiers: for tier in StrategyTier::ORDER {
            let mut strategies = plan.tier(tier).peekable();
            if strategies.peek().is_none() {
                continue;
            }
            if tier == StrategyTier::Ai && !ai_allowed {
                debug!(url = %request.url, "AI tier disabled for this request");
                break;
            }

            state = transition(state, EscalationState::trying(tier), &request.url);

            for strategy in strategies {
                match strategy.attempt(request, page).await {
                    ExtractionOutcome::Success { value, label } => {
                        transition(state, EscalationState::Succeeded, &request.url);
                        info!(
                            url = %request.url,
                            route = plan.route(),
                            strategy = strategy.name(),
                            tier = %tier,
                            %value,
                            "value extracted"
                        );
                        return Resolution::Succeeded {
                            value,
                            label,
                            strategy: strategy.name().to_string(),
                            tier,
                        };
                    }
                    ExtractionOutcome::Failure { kind, detail } => {
                        debug!(
                            url = %request.url,
                            strategy = strategy.name(),
                            tier = %tier,
                            kind = %kind,
                            detail = %detail,
                            "strategy missed"
                        );
                        attempts.push(AttemptRecord {
                            strategy: strategy.name().to_string(),
                            tier,
                            kind,
                            detail,
                        });
                        if !kind.escalates() {
                            break 'tiers;
                        }
                    }
                }
            }
        }

        transition(state, EscalationState::ExhaustedFailed, &request.url);
        info!(
            url = %request.url,
            route = plan.route(),
            attempts = attempts.len(),
            "all tiers exhausted"
        );
        Resolution::Exhausted { attempts }
    }
}

fn transition(from: EscalationState, to: EscalationState, url: &str) -> EscalationState {
    debug!(url = %url, from = %from, to = %to, "escalation transition");
    to
}
