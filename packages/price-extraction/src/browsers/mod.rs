//! Browser implementations.
//!
//! - `HttpBrowser` - plain HTTP fetch + static HTML rendering
//! - `MockBrowser` (in [`crate::testing`]) - canned pages for tests

mod http;
pub mod render;

pub use http::HttpBrowser;

// Re-export from traits for convenience
pub use crate::traits::browser::Browser;
