//! Extraction pipeline - routing, escalation and reporting.
//!
//! The pipeline orchestrates:
//! - Route lookup (custom handler, API lookups, generic strategies, AI)
//! - Per-request page access shared by every strategy
//! - Tiered escalation with short-circuit on the first plausible value
//! - Projection onto the normalized per-URL mapping
//! - Sequential batch runs over one browser session

pub mod batch;
pub mod controller;
pub mod report;
pub mod router;
pub mod routes;
pub mod session;

pub use batch::{BatchRunner, BatchSummary};
pub use controller::{AttemptRecord, EscalationController, EscalationState, Resolution};
pub use report::report;
pub use router::{DomainRoute, DomainRouter, RouterBuilder, RoutePlan, DEFAULT_ROUTE};
pub use routes::{builtin_routes, load_route_file, PatternSpec, RouteSpec, ValidatorOverrides};
pub use session::{PageAccess, PageLoadError};
