//! Label-driven text scanning for sites without a custom handler.

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use crate::pipeline::session::PageAccess;
use crate::strategies::scan::{check_candidate, tally, CandidateRules, LabelValidators, ScanStats};
use crate::traits::strategy::ExtractionStrategy;
use crate::types::{
    outcome::{ExtractionOutcome, StrategyTier},
    request::ExtractionRequest,
};
use crate::validation::numeric::NUMBER_TOKEN;

/// Characters after a label searched for its number.
pub const DEFAULT_REACH: usize = 60;

/// Finds `label … number` in the visible text, trying labels in request
/// order.
pub struct LabelTextStrategy {
    validators: LabelValidators,
    reach: usize,
}

impl Default for LabelTextStrategy {
    fn default() -> Self {
        Self::new(LabelValidators::default())
    }
}

impl LabelTextStrategy {
    pub fn new(validators: LabelValidators) -> Self {
        Self {
            validators,
            reach: DEFAULT_REACH,
        }
    }

    /// Set how far past a label to look.
    pub fn with_reach(mut self, chars: usize) -> Self {
        self.reach = chars;
        self
    }

    /// Scan already-rendered text for the request's labels.
    pub fn scan_text(
        &self,
        request: &ExtractionRequest,
        text: &str,
        source_url: &str,
    ) -> ExtractionOutcome {
        let validator = self.validators.for_request(request);
        let rules = CandidateRules::default();
        let mut stats = ScanStats::default();

        for label in &request.labels {
            let Some(label_regex) = label_pattern(label) else {
                continue;
            };

            for label_match in label_regex.find_iter(text) {
                let from = label_match.end();
                let to = text[from..]
                    .char_indices()
                    .nth(self.reach)
                    .map_or(text.len(), |(i, _)| from + i);

                // Tokens may run past `to`; only their start must be in reach
                for number in NUMBER_TOKEN.find_iter(&text[from..]) {
                    if from + number.start() >= to {
                        break;
                    }
                    let verdict = check_candidate(
                        text,
                        from + number.start(),
                        from + number.end(),
                        &rules,
                        validator,
                        source_url,
                    );
                    if let Some(value) = tally(&mut stats, verdict) {
                        debug!(label = %label, %value, "label text matched");
                        return ExtractionOutcome::success(value, label.as_str());
                    }
                }
            }
        }

        stats.into_failure(self.name())
    }
}

/// Case-insensitive regex for `label`, anchored on word boundaries where the
/// label starts or ends with a word character.
fn label_pattern(label: &str) -> Option<Regex> {
    let boundary = |c: Option<char>| {
        if c.is_some_and(char::is_alphanumeric) {
            r"\b"
        } else {
            ""
        }
    };
    let pattern = format!(
        "(?i){}{}{}",
        boundary(label.chars().next()),
        regex::escape(label).replace(' ', r"\s+"),
        boundary(label.chars().last())
    );

    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(label = %label, error = %e, "label pattern rejected");
            None
        }
    }
}

#[async_trait]
impl ExtractionStrategy for LabelTextStrategy {
    fn name(&self) -> &str {
        "generic-text"
    }

    fn tier(&self) -> StrategyTier {
        StrategyTier::Generic
    }

    async fn attempt(
        &self,
        request: &ExtractionRequest,
        page: &mut PageAccess<'_>,
    ) -> ExtractionOutcome {
        match page.load(&request.url).await {
            Ok(snapshot) => self.scan_text(request, &snapshot.text, &snapshot.final_url),
            Err(err) => err.into(),
        }
    }
}
