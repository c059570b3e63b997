//! Sink trait: where normalized results go (spreadsheet, file, database).

use async_trait::async_trait;

use crate::error::Result;
use crate::types::report::BatchRow;

/// Receives one row per processed request, in processing order.
#[async_trait]
pub trait ResultSink: Send {
    /// Persist a row. An error aborts the batch.
    async fn write(&mut self, row: &BatchRow) -> Result<()>;

    /// Flush buffered rows. Called once after the last row.
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps rows in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub rows: Vec<BatchRow>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultSink for VecSink {
    async fn write(&mut self, row: &BatchRow) -> Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}
