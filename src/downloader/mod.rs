//! Per-row download pipeline
//!
//! Rows are processed strictly one at a time in input order. A row either ends
//! up as a file in the output directory or as an [`ErrorRecord`]; no failure
//! stops the run.

use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::{PersistError, RowSourceError};
use crate::models::{ErrorRecord, RowRecord};
use crate::report::ErrorCollector;
use crate::target;

pub mod fetcher;
pub mod persist;

pub use fetcher::{Body, FetchOutcome, Fetcher};

/// What happened to a single row.
#[derive(Debug)]
pub enum RowOutcome {
    Saved(PathBuf),
    Failed(ErrorRecord),
    /// Fetched fine, but the body could not be written.
    NotSaved(PersistError),
}

/// Totals for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub saved: usize,
    pub failed: usize,
    pub persist_failures: usize,
    /// Rows the input reader could not decode at all
    pub unreadable_rows: usize,
    /// Error report path, when one was written
    pub report: Option<PathBuf>,
}

pub struct Downloader {
    fetcher: Fetcher,
    base_uri: String,
    output_dir: PathBuf,
    errors_path: PathBuf,
}

impl Downloader {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::with_fetcher(Fetcher::new(&config.http)?, config))
    }

    pub fn with_fetcher(fetcher: Fetcher, config: &Config) -> Self {
        Self {
            fetcher,
            base_uri: config.base_uri.clone(),
            output_dir: config.output_dir.clone(),
            errors_path: config.errors_path.clone(),
        }
    }

    /// Build the target, fetch it, and persist the body on success.
    pub async fn process_row(&self, row: RowRecord) -> RowOutcome {
        let target = target::build(&row, &self.base_uri);
        info!("Downloading file from {}", target.uri);

        match self.fetcher.fetch(&target).await {
            FetchOutcome::Success(body) => {
                match persist::save(body.into_stream(), &self.output_dir, &target.local_name).await {
                    Ok(path) => {
                        debug!("Saved {}", path.display());
                        RowOutcome::Saved(path)
                    }
                    Err(e) => {
                        error!("{}", e);
                        RowOutcome::NotSaved(e)
                    }
                }
            }
            FetchOutcome::Failure(caught_error) => {
                warn!(
                    "! Error downloading {} as {}: {}",
                    target.uri,
                    target.local_name,
                    caught_error.kind().message()
                );
                RowOutcome::Failed(ErrorRecord::new(caught_error, row))
            }
        }
    }

    /// Process every row, then write the error report if anything failed.
    pub async fn run<I>(&self, rows: I) -> RunSummary
    where
        I: IntoIterator<Item = Result<RowRecord, RowSourceError>>,
    {
        let mut collector = ErrorCollector::new();
        let mut summary = RunSummary::default();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    error!("Skipping unreadable row: {}", e);
                    summary.unreadable_rows += 1;
                    continue;
                }
            };

            summary.rows += 1;
            match self.process_row(row).await {
                RowOutcome::Saved(_) => summary.saved += 1,
                RowOutcome::Failed(record) => {
                    summary.failed += 1;
                    collector.record(record);
                }
                RowOutcome::NotSaved(_) => summary.persist_failures += 1,
            }
        }

        if !collector.is_empty() {
            info!(
                "{} error(s) found, saving to {}",
                collector.len(),
                self.errors_path.display()
            );
        }

        match collector.flush(&self.errors_path).await {
            Ok(Some(_)) => summary.report = Some(self.errors_path.clone()),
            Ok(None) => {}
            Err(e) => error!("{}", e),
        }

        summary
    }
}
