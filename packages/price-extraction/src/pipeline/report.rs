//! Projection of a resolution onto the normalized per-URL mapping.

use crate::pipeline::controller::Resolution;
use crate::types::{report::NormalizedResult, request::ExtractionRequest};

/// `{primary label: value}` on success, `{"error": diagnostic}` otherwise.
///
/// The value is keyed by the label the caller asked for first, even when a
/// strategy found it under an alternate label.
pub fn report(request: &ExtractionRequest, resolution: &Resolution) -> NormalizedResult {
    match resolution {
        Resolution::Succeeded { value, .. } => {
            NormalizedResult::success(request.primary_label(), *value)
        }
        Resolution::Exhausted { .. } => NormalizedResult::error(resolution.diagnostic()),
    }
}
