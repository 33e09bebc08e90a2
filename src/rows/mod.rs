//! Tabular input readers
//!
//! Both providers expose the same capability: a lazy, finite iterator of
//! [`RowRecord`]s read from an opened file, with the header row already skipped.

use std::fs::File;
use std::path::Path;
use tracing::warn;

use crate::errors::RowSourceError;
use crate::models::RowRecord;

pub mod delimited;
pub mod xlsx;

pub use delimited::DelimitedRows;
pub use xlsx::XlsxRows;

/// Columns expected in every input row.
pub const COLUMN_COUNT: usize = 4;

/// Rows produced by any provider.
pub type RowIter = Box<dyn Iterator<Item = Result<RowRecord, RowSourceError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Xlsx,
}

impl InputFormat {
    pub fn as_str(&self) -> &str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Xlsx => "xlsx",
        }
    }

    pub fn parse(format: &str) -> Result<Self, RowSourceError> {
        match format.to_lowercase().as_str() {
            "csv" | "txt" => Ok(InputFormat::Csv),
            "xlsx" | "excel" => Ok(InputFormat::Xlsx),
            other => Err(RowSourceError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, RowSourceError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::parse(extension)
    }
}

/// Open `path` with the provider for `format`.
pub fn open(path: &Path, format: InputFormat) -> Result<RowIter, RowSourceError> {
    match format {
        InputFormat::Csv => Ok(Box::new(DelimitedRows::new(File::open(path)?))),
        InputFormat::Xlsx => Ok(Box::new(XlsxRows::open(path)?)),
    }
}

/// Build a row from raw cells. Never fails: a short row is padded with empty
/// strings and a non-integer publication year becomes 0.
pub(crate) fn row_from_cells(cells: &[String], line: u64) -> RowRecord {
    if cells.len() < COLUMN_COUNT {
        warn!(
            "Row {} has {} of {} columns; missing cells read as empty",
            line,
            cells.len(),
            COLUMN_COUNT
        );
    }

    let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();

    let year_cell = cell(3);
    let publication_year = match year_cell.parse::<i64>() {
        Ok(year) => year,
        Err(e) => {
            warn!(
                "Row {}: publication year '{}' is not an integer ({}); using 0",
                line, year_cell, e
            );
            0
        }
    };

    RowRecord {
        work_title: cell(0),
        author_last_name: cell(1),
        author_first_name: cell(2),
        publication_year,
    }
}
