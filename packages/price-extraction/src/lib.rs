//! ETF/ETN Price Extraction Library
//!
//! Pulls share prices and outstanding-share counts off issuer web pages.
//! Each URL is routed to an ordered list of strategies (custom domain
//! handler, API lookup, generic table and text scraping, AI fallback); every
//! candidate number goes through one shared plausibility validator, and the
//! outcome is reported as a single-key mapping for a spreadsheet or file
//! writer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use price_extraction::{
//!     BatchRunner, DomainRouter, EscalationController, ExtractionRequest, HttpBrowser,
//!     PipelineConfig, VecSink,
//! };
//! use std::sync::Arc;
//!
//! let router = DomainRouter::builder().with_builtin_catalog().build()?;
//! let runner = BatchRunner::new(EscalationController::new(
//!     Arc::new(router),
//!     PipelineConfig::default(),
//! ));
//!
//! let mut browser = HttpBrowser::new()?;
//! let mut sink = VecSink::new();
//! let requests = vec![ExtractionRequest::new("https://www.ishares.com/us/products/239726/")];
//! let summary = runner.run(&mut browser, requests, &mut sink).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (Browser, PriceAnalyzer, ExtractionStrategy, ResultSink)
//! - [`types`] - Requests, outcomes, pages, reports and configuration
//! - [`validation`] - Number parsing and the plausibility validator
//! - [`strategies`] - Pattern, API, table, text and AI strategies
//! - [`pipeline`] - Router, escalation controller, reporter and batch runner
//! - [`browsers`] - HTTP browser implementation
//! - [`testing`] - Mock implementations for testing

pub mod browsers;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod secret;
pub mod strategies;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validation;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use browsers::HttpBrowser;
pub use error::{BrowserError, ExtractionError, ParseNumberError, RouteError};
pub use pipeline::{
    report, BatchRunner, BatchSummary, DomainRoute, DomainRouter, EscalationController,
    EscalationState, PageAccess, Resolution, RoutePlan, RouteSpec,
};
pub use secret::SecretString;
pub use traits::{
    analyzer::PriceAnalyzer,
    browser::Browser,
    sink::{ResultSink, VecSink},
    strategy::ExtractionStrategy,
};
pub use types::{
    config::{PipelineConfig, ValidatorConfig},
    outcome::{ExtractionOutcome, FailureKind, StrategyTier},
    page::PageSnapshot,
    report::{BatchRow, NormalizedResult},
    request::ExtractionRequest,
};
pub use validation::{parse_number, NumberFormat, PlausibilityValidator};
