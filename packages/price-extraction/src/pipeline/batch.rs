//! Sequential batch runs over one browser session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::controller::{EscalationController, Resolution};
use crate::pipeline::report::report;
use crate::traits::{browser::Browser, sink::ResultSink};
use crate::types::{report::BatchRow, request::ExtractionRequest};

/// Counters for a finished batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl BatchSummary {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            processed: 0,
            succeeded: 0,
            failed: 0,
            duration_ms: 0,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Processes requests one at a time and hands each result to a sink.
///
/// One URL's failure is a row, not an error; only the sink can abort a run.
/// The browser is shut down when the run ends either way.
pub struct BatchRunner {
    controller: EscalationController,
}

impl BatchRunner {
    pub fn new(controller: EscalationController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &EscalationController {
        &self.controller
    }

    pub async fn run(
        &self,
        browser: &mut dyn Browser,
        requests: impl IntoIterator<Item = ExtractionRequest>,
        sink: &mut dyn ResultSink,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::new(Uuid::new_v4());
        let started = Instant::now();
        info!(run_id = %summary.run_id, browser = browser.name(), "batch starting");

        let outcome = self
            .process_all(browser, requests, sink, &mut summary)
            .await;

        if let Err(e) = browser.shutdown().await {
            warn!(run_id = %summary.run_id, error = %e, "browser shutdown failed");
        }
        summary.duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                info!(
                    run_id = %summary.run_id,
                    processed = summary.processed,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    duration_ms = summary.duration_ms,
                    "batch finished"
                );
                Ok(summary)
            }
            Err(e) => {
                warn!(
                    run_id = %summary.run_id,
                    processed = summary.processed,
                    error = %e,
                    "batch aborted"
                );
                Err(e)
            }
        }
    }

    async fn process_all(
        &self,
        browser: &mut dyn Browser,
        requests: impl IntoIterator<Item = ExtractionRequest>,
        sink: &mut dyn ResultSink,
        summary: &mut BatchSummary,
    ) -> Result<()> {
        for (index, request) in requests.into_iter().enumerate() {
            let resolution = self.controller.resolve(&mut *browser, &request).await;

            let (strategy, tier) = match &resolution {
                Resolution::Succeeded { strategy, tier, .. } => {
                    summary.succeeded += 1;
                    (Some(strategy.clone()), Some(*tier))
                }
                Resolution::Exhausted { .. } => {
                    summary.failed += 1;
                    (None, None)
                }
            };
            summary.processed += 1;

            let row = BatchRow {
                index,
                url: request.url.clone(),
                result: report(&request, &resolution),
                strategy,
                tier,
                processed_at: Utc::now(),
            };
            sink.write(&row).await?;
        }

        sink.flush().await
    }
}
