//! CSV row provider

use std::io::Read;

use super::row_from_cells;
use crate::errors::RowSourceError;
use crate::models::RowRecord;

/// Reads rows from comma-separated text. The first record is the header.
pub struct DelimitedRows<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
}

impl<R: Read> DelimitedRows<R> {
    pub fn new(reader: R) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader)
            .into_records();

        Self { records }
    }
}

impl<R: Read> Iterator for DelimitedRows<R> {
    type Item = Result<RowRecord, RowSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cells: Vec<String> = record.iter().map(String::from).collect();
        Some(Ok(row_from_cells(&cells, line)))
    }
}
