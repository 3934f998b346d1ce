use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::{CellValue, ParseError, ParsedSheet, SheetBuilder, TabularFormat};

pub(super) fn read_csv(path: &Path, max_rows: usize) -> Result<ParsedSheet, ParseError> {
    let file = File::open(path).map_err(|e| ParseError::Unreadable(e.to_string()))?;
    read_csv_from(BufReader::new(file), max_rows)
}

/// Comma-delimited, header required, every cell trimmed. Empty lines and lines
/// holding only delimiters are both dropped without taking a row number.
fn read_csv_from<R: Read>(reader: R, max_rows: usize) -> Result<ParsedSheet, ParseError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let header = reader
        .headers()
        .map_err(|e| ParseError::Unreadable(e.to_string()))?
        .clone();
    if header.is_empty() {
        return Err(ParseError::MissingHeader);
    }

    let mut builder = SheetBuilder::new(TabularFormat::Csv, header.iter(), max_rows)?;
    let mut number = 0;
    for record in reader.records() {
        let record = record.map_err(|e| ParseError::Unreadable(e.to_string()))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        number += 1;
        builder.push(number, record.iter().map(CellValue::text))?;
    }
    builder.finish()
}
