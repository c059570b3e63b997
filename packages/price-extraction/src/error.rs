//! Typed errors for the price extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Note that expected
//! extraction misses are *not* errors: they travel as
//! [`FailureKind`](crate::types::outcome::FailureKind) data so the
//! escalation controller can move on to the next strategy.

use thiserror::Error;

/// Errors raised while building or running the pipeline infrastructure.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Browser session failure outside of a strategy attempt
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// AI service unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Route table could not be built
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// Result sink rejected a row
    #[error("sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors reported by a browser session.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Page did not reach a ready state within the bounded wait
    #[error("timeout loading: {url}")]
    Timeout { url: String },

    /// Navigation could not start or the server refused the page
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Accessor called before any page was loaded
    #[error("no page loaded")]
    NoPage,

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised while compiling route specifications into strategies.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Pattern regex did not compile
    #[error("invalid pattern {pattern:?} in route {route}: {source}")]
    InvalidPattern {
        route: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Pattern regex has no capture group for the number
    #[error("pattern {pattern:?} in route {route} has no capture group")]
    MissingCapture { route: String, pattern: String },

    /// Route lists strategies out of tier order or more than one custom handler
    #[error("route {route} violates tier ordering: {reason}")]
    TierOrder { route: String, reason: String },

    /// Route has no host
    #[error("route {route} has an empty host")]
    EmptyHost { route: String },

    /// Number literal in a route file could not be parsed
    #[error("invalid number {value:?} in route {route}")]
    InvalidNumber { route: String, value: String },
}

/// Failure to read a numeric literal out of page text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNumberError {
    /// Nothing numeric left after stripping symbols
    #[error("no digits in {0:?}")]
    NoDigits(String),

    /// Characters that cannot appear in a number
    #[error("unexpected character {ch:?} in {input:?}")]
    UnexpectedChar { input: String, ch: char },

    /// Separators in an impossible arrangement (e.g. "1,2,3")
    #[error("malformed digit grouping in {0:?}")]
    Grouping(String),

    /// Value does not fit an exact decimal
    #[error("value out of range: {0:?}")]
    Overflow(String),
}

/// Result type alias for pipeline infrastructure operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for browser operations.
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type alias for route compilation.
pub type RouteResult<T> = std::result::Result<T, RouteError>;
