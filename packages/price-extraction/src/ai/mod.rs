//! AI implementations for the price extraction library.
//!
//! This module provides reference implementations of the `PriceAnalyzer`
//! trait. Users can use these directly or implement their own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiAnalyzer;
