//! Error types for row reading, persistence and reporting

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowSourceError {
    #[error("Unsupported input format '{0}'. Supported formats: csv, xlsx")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XLSX XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Workbook has no worksheet")]
    MissingWorksheet,

    #[error("Invalid shared string index '{0}'")]
    SharedString(String),

    #[error("Invalid cell reference '{0}'")]
    CellReference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::events::attributes::AttrError> for RowSourceError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        RowSourceError::Xml(err.into())
    }
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Response body failed while writing {path}: {message}")]
    Body { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize error report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write error report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
