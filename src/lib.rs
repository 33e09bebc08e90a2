//! Bulk downloader for literary texts listed in a spreadsheet or CSV file.
//!
//! Each input row names a work and its author. The text is fetched from
//! `<base URI><last name> - <title>.txt`, written to `<output dir>/<last name>.txt`,
//! and every failed fetch is collected into a JSON error report.

pub mod cli;
pub mod config;
pub mod downloader;
pub mod errors;
pub mod models;
pub mod report;
pub mod rows;
pub mod target;

pub use downloader::{Downloader, RunSummary};
pub use models::{CaughtError, DownloadTarget, ErrorRecord, RowRecord};
