//! Numeric parsing and plausibility checks shared by every strategy.

pub mod numeric;
pub mod plausibility;

pub use numeric::{is_flat, parse_number, NumberFormat};
pub use plausibility::{context_window, find_keyword, PlausibilityValidator, Rejection};
