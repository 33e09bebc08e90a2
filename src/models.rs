use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One input row describing a work to download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    pub work_title: String,
    pub author_last_name: String,
    pub author_first_name: String,
    pub publication_year: i64,
}

/// Remote URI and local file stem computed for a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub uri: String,
    pub local_name: String,
}

/// Diagnostic payload attached to a failed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaughtError {
    /// The request never produced a response.
    #[serde(rename_all = "camelCase")]
    TransportFailure { detail: String },
    /// The server answered with something other than 200.
    #[serde(rename_all = "camelCase")]
    StatusFailure {
        status: String,
        status_code: u16,
        header: BTreeMap<String, Vec<String>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    HttpStatus,
}

impl FailureKind {
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::Transport => "Error occurred during the HTTP request",
            FailureKind::HttpStatus => "HTTP response status code was not 200",
        }
    }
}

impl CaughtError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CaughtError::TransportFailure { .. } => FailureKind::Transport,
            CaughtError::StatusFailure { .. } => FailureKind::HttpStatus,
        }
    }
}

/// Entry of the error report written at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub caught_error: CaughtError,
    pub message: String,
    pub row_data: RowRecord,
}

impl ErrorRecord {
    pub fn new(caught_error: CaughtError, row_data: RowRecord) -> Self {
        let message = caught_error.kind().message().to_string();
        Self {
            caught_error,
            message,
            row_data,
        }
    }
}
