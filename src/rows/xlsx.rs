//! XLSX row provider
//!
//! An `.xlsx` workbook is a ZIP archive of XML parts. Rows are read lazily from
//! the first worksheet in workbook order; cell text is resolved against the
//! shared string table.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use super::row_from_cells;
use crate::errors::RowSourceError;
use crate::models::RowRecord;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const FALLBACK_SHEET_PART: &str = "xl/worksheets/sheet1.xml";
/// Column count of a worksheet (`A` to `XFD`).
const MAX_COLUMNS: usize = 16_384;

pub struct XlsxRows {
    reader: Reader<Cursor<Vec<u8>>>,
    shared_strings: Vec<String>,
    buf: Vec<u8>,
    rows_seen: u64,
    header_skipped: bool,
    done: bool,
}

impl XlsxRows {
    pub fn open(path: &Path) -> Result<Self, RowSourceError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, RowSourceError> {
        let mut archive = ZipArchive::new(reader)?;

        let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let sheet_part = first_sheet_part(&mut archive)?;
        debug!("Reading worksheet {}", sheet_part);
        let sheet = read_part(&mut archive, &sheet_part)?.ok_or(RowSourceError::MissingWorksheet)?;

        Ok(Self {
            reader: Reader::from_reader(Cursor::new(sheet)),
            shared_strings,
            buf: Vec::new(),
            rows_seen: 0,
            header_skipped: false,
            done: false,
        })
    }

    /// Cells of the next `<row>` element, or `None` at the end of the sheet.
    ///
    /// The outer error ends the sheet. The inner one is a bad value in a single
    /// row; the reader is left after that row's `</row>` so reading can go on.
    fn next_cells(&mut self) -> Result<Option<Result<Vec<String>, RowSourceError>>, RowSourceError> {
        let Self {
            reader,
            shared_strings,
            buf,
            ..
        } = self;

        let mut cells = Vec::new();
        let mut in_row = false;
        let mut cell: Option<CellRef> = None;
        let mut value = String::new();
        let mut capturing = false;
        let mut row_error: Option<RowSourceError> = None;

        loop {
            buf.clear();
            match reader.read_event_into(buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"row" => {
                        in_row = true;
                        cells.clear();
                        row_error = None;
                    }
                    b"c" if in_row => {
                        cell = Some(CellRef::from_start(&e)?);
                        value.clear();
                    }
                    b"v" | b"t" if cell.is_some() => capturing = true,
                    _ => {}
                },
                Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                    return Ok(Some(Ok(Vec::new())));
                }
                Event::Text(text) if capturing => value.push_str(&text.unescape()?),
                Event::End(e) => match e.local_name().as_ref() {
                    b"v" | b"t" => capturing = false,
                    b"c" => {
                        let Some(current) = cell.take() else { continue };
                        let resolved = match current.column(cells.len()) {
                            Ok(column) => resolve(shared_strings, &current.kind, &value)
                                .map(|text| (column, text)),
                            Err(e) => Err(e),
                        };
                        match resolved {
                            Ok((column, text)) => place(&mut cells, column, text),
                            Err(e) => {
                                if row_error.is_none() {
                                    row_error = Some(e);
                                }
                            }
                        }
                    }
                    b"row" => {
                        return Ok(Some(match row_error {
                            Some(e) => Err(e),
                            None => Ok(cells),
                        }));
                    }
                    _ => {}
                },
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for XlsxRows {
    type Item = Result<RowRecord, RowSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.next_cells() {
                Ok(Some(Ok(cells))) => {
                    if cells.iter().all(|c| c.is_empty()) {
                        continue;
                    }
                    self.rows_seen += 1;
                    if !self.header_skipped {
                        self.header_skipped = true;
                        continue;
                    }
                    return Some(Ok(row_from_cells(&cells, self.rows_seen)));
                }
                Ok(Some(Err(e))) => {
                    self.rows_seen += 1;
                    if !self.header_skipped {
                        self.header_skipped = true;
                        continue;
                    }
                    return Some(Err(e));
                }
                Ok(None) => self.done = true,
                Err(e) => {
                    // The XML reader cannot resynchronise after a parse error.
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Position and type of the cell being read.
struct CellRef {
    reference: Option<String>,
    kind: String,
}

impl CellRef {
    fn from_start(start: &BytesStart) -> Result<Self, RowSourceError> {
        let mut reference = None;
        let mut kind = String::new();

        for attr in start.attributes() {
            let attr = attr?;
            match attr.key.local_name().as_ref() {
                b"r" => reference = Some(attr.unescape_value()?.into_owned()),
                b"t" => kind = attr.unescape_value()?.into_owned(),
                _ => {}
            }
        }

        Ok(Self { reference, kind })
    }

    /// Column from the `r` attribute, or the next free one when it is absent.
    fn column(&self, next_column: usize) -> Result<usize, RowSourceError> {
        match &self.reference {
            None => Ok(next_column),
            Some(reference) => column_index(reference)
                .ok_or_else(|| RowSourceError::CellReference(reference.clone())),
        }
    }
}

/// Zero-based column of a cell reference such as `C7` or `AB12`.
///
/// `None` when the reference has no column letters or lies past `XFD`.
fn column_index(reference: &str) -> Option<usize> {
    let mut column = 0usize;
    let mut letters = 0;

    for ch in reference.chars().take_while(|c| c.is_ascii_alphabetic()) {
        let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
        column = column.checked_mul(26)?.checked_add(digit)?;
        if column > MAX_COLUMNS {
            return None;
        }
        letters += 1;
    }

    if letters == 0 {
        None
    } else {
        Some(column - 1)
    }
}

fn resolve(shared_strings: &[String], kind: &str, value: &str) -> Result<String, RowSourceError> {
    match kind {
        "s" => value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared_strings.get(index).cloned())
            .ok_or_else(|| RowSourceError::SharedString(value.to_string())),
        "b" => Ok(if value.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
        _ => Ok(value.to_string()),
    }
}

fn place(cells: &mut Vec<String>, column: usize, text: String) {
    if column >= cells.len() {
        cells.resize(column + 1, String::new());
    }
    cells[column] = text;
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, RowSourceError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, RowSourceError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(text) if in_text && !in_phonetic => current.push_str(&text.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Archive path of the first worksheet listed in the workbook.
fn first_sheet_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, RowSourceError> {
    let (Some(workbook), Some(rels)) = (
        read_part(archive, WORKBOOK_PART)?,
        read_part(archive, WORKBOOK_RELS_PART)?,
    ) else {
        return Ok(FALLBACK_SHEET_PART.to_string());
    };

    let Some(relationship_id) = first_sheet_relationship(&workbook)? else {
        return Err(RowSourceError::MissingWorksheet);
    };

    match relationship_target(&rels, &relationship_id)? {
        Some(target) if target.starts_with('/') => Ok(target.trim_start_matches('/').to_string()),
        Some(target) => Ok(format!("xl/{}", target)),
        None => Ok(FALLBACK_SHEET_PART.to_string()),
    }
}

fn first_sheet_relationship(workbook: &[u8]) -> Result<Option<String>, RowSourceError> {
    let mut reader = Reader::from_reader(workbook);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                for attr in e.attributes() {
                    let attr = attr?;
                    // `r:id`, whatever the relationships namespace prefix is
                    if attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some() {
                        return Ok(Some(attr.unescape_value()?.into_owned()));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

fn relationship_target(rels: &[u8], id: &str) -> Result<Option<String>, RowSourceError> {
    let mut reader = Reader::from_reader(rels);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut matches = false;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => matches = attr.unescape_value()? == id,
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if matches {
                    return Ok(target);
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}
