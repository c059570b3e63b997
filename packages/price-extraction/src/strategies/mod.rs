//! Extraction strategies, one per escalation tier flavor.
//!
//! - [`PatternStrategy`] - ordered regex list for a custom domain handler
//! - [`ApiLookupStrategy`] - JSON endpoint derived from the product URL
//! - [`TableStrategy`], [`LabelTextStrategy`] - generic label-driven scraping
//! - [`AiFallbackStrategy`] - language model over the rendered text

pub mod ai;
pub mod api;
pub mod generic_text;
pub mod pattern;
pub mod scan;
pub mod table;

pub use ai::AiFallbackStrategy;
pub use api::{ApiLookupStrategy, ApiSpec};
pub use generic_text::LabelTextStrategy;
pub use pattern::{PatternStrategy, PricePattern};
pub use scan::{LabelValidators, ValueRange};
pub use table::TableStrategy;
