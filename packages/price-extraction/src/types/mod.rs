//! Data types for requests, outcomes, pages, reports and configuration.

pub mod config;
pub mod outcome;
pub mod page;
pub mod report;
pub mod request;
