//! Run-scoped collection of failed downloads

use std::path::Path;
use tracing::debug;

use crate::errors::ReportError;
use crate::models::ErrorRecord;

/// Append-only list of failures in the order they were encountered.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    records: Vec<ErrorRecord>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Write the collected records to `path` as a JSON array.
    ///
    /// Returns the number written, or `None` without touching the filesystem
    /// when nothing was collected.
    pub async fn flush(&self, path: &Path) -> Result<Option<usize>, ReportError> {
        if self.records.is_empty() {
            return Ok(None);
        }

        let json = serde_json::to_vec_pretty(&self.records)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| ReportError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Wrote {} error records to {}", self.records.len(), path.display());
        Ok(Some(self.records.len()))
    }
}
