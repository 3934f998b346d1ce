use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::{CellValue, ParseError, ParsedSheet, SheetBuilder, TabularFormat};

/// Read the first worksheet (by position) of an XLSX/XLS workbook.
///
/// XLSX sheets are streamed cell by cell, so the row limit stops the read before
/// an oversized sheet is held in memory. XLS has no streaming reader and is
/// loaded as a whole range.
pub(super) fn read_first_sheet(
    path: &Path,
    format: TabularFormat,
    max_rows: usize,
) -> Result<ParsedSheet, ParseError> {
    let file = File::open(path).map_err(|e| ParseError::Unreadable(e.to_string()))?;
    let reader = BufReader::new(file);

    match format {
        TabularFormat::Xlsx => stream_xlsx(open_workbook_from_rs(reader), max_rows),
        TabularFormat::Xls => {
            let range = first_range(open_workbook_from_rs::<Xls<_>, _>(reader))?;
            sheet_from_range(&range, format, max_rows)
        }
        TabularFormat::Csv => Err(ParseError::UnsupportedFormat(format.extension().to_string())),
    }
}

fn unreadable(err: impl Display) -> ParseError {
    ParseError::Unreadable(err.to_string())
}

fn stream_xlsx(
    workbook: Result<Xlsx<BufReader<File>>, calamine::XlsxError>,
    max_rows: usize,
) -> Result<ParsedSheet, ParseError> {
    let mut workbook = workbook.map_err(unreadable)?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| unreadable("workbook has no worksheets"))?;
    let mut cells = workbook.worksheet_cells_reader(&name).map_err(unreadable)?;

    let mut rows = RowAssembler::new(max_rows);
    while let Some(cell) = cells.next_cell().map_err(unreadable)? {
        let value = cell_value(&Data::from(cell.get_value().clone()));
        if value.is_blank() {
            continue;
        }
        let (row, column) = cell.get_position();
        rows.add(row, column as usize, value)?;
    }
    rows.finish()
}

/// Groups streamed cells into rows. The first row holding any value is the header.
struct RowAssembler {
    max_rows: usize,
    header: Option<(u32, SheetBuilder)>,
    current: Option<(u32, Vec<CellValue>)>,
}

impl RowAssembler {
    fn new(max_rows: usize) -> Self {
        Self {
            max_rows,
            header: None,
            current: None,
        }
    }

    fn add(&mut self, row: u32, column: usize, value: CellValue) -> Result<(), ParseError> {
        if self.current.as_ref().is_some_and(|(r, _)| *r != row) {
            self.flush()?;
        }
        let (_, values) = self.current.get_or_insert_with(|| (row, Vec::new()));
        if values.len() <= column {
            values.resize(column + 1, CellValue::Empty);
        }
        values[column] = value;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ParseError> {
        let Some((row, values)) = self.current.take() else {
            return Ok(());
        };
        match &mut self.header {
            Some((header_row, builder)) => {
                builder.push((row - *header_row) as usize, values)?;
            }
            None => {
                let header_text: Vec<String> = values
                    .iter()
                    .map(|cell| cell.as_text().unwrap_or_default())
                    .collect();
                let builder = SheetBuilder::new(
                    TabularFormat::Xlsx,
                    header_text.iter().map(String::as_str),
                    self.max_rows,
                )?;
                self.header = Some((row, builder));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<ParsedSheet, ParseError> {
        self.flush()?;
        match self.header {
            Some((_, builder)) => builder.finish(),
            None => Err(ParseError::MissingHeader),
        }
    }
}

fn first_range<W>(workbook: Result<W, W::Error>) -> Result<Range<Data>, ParseError>
where
    W: Reader<BufReader<File>>,
    W::Error: Display,
{
    let mut workbook = workbook.map_err(unreadable)?;
    match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(unreadable(e)),
        None => Err(unreadable("workbook has no worksheets")),
    }
}

fn sheet_from_range(
    range: &Range<Data>,
    format: TabularFormat,
    max_rows: usize,
) -> Result<ParsedSheet, ParseError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(ParseError::MissingHeader)?;
    let header_text: Vec<String> = header
        .iter()
        .map(|cell| cell_value(cell).as_text().unwrap_or_default())
        .collect();

    let mut builder = SheetBuilder::new(format, header_text.iter().map(String::as_str), max_rows)?;
    for (index, cells) in rows.enumerate() {
        builder.push(index + 1, cells.iter().map(cell_value))?;
    }
    builder.finish()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        // Serial date number, as the workbook stores it
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}
