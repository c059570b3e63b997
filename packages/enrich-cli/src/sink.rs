//! JSON-lines result sink.

use async_trait::async_trait;
use price_extraction::{error::Result, BatchRow, ExtractionError, ResultSink};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes one JSON object per processed URL.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> ResultSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, row: &BatchRow) -> Result<()> {
        let mut line = serde_json::to_vec(row)?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .await
            .map_err(|e| ExtractionError::Sink(Box::new(e)))
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| ExtractionError::Sink(Box::new(e)))
    }
}
