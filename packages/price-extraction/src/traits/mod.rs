//! Core trait abstractions for the price extraction library.
//!
//! These traits define the collaborator seams: the browser session, the AI
//! service, the strategies the router hands out, and the result sink.

pub mod analyzer;
pub mod browser;
pub mod sink;
pub mod strategy;
