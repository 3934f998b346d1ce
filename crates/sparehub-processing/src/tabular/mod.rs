//! Tabular parser: XLSX/XLS/CSV files to ordered [`RawRow`]s.
//!
//! The first non-empty row is the header; column names are trimmed and
//! lower-cased. Row numbers are 1-based over data rows (header excluded).
//! Fully blank spreadsheet rows are skipped but keep their number, so reported
//! rows match what the seller sees below the header. In CSV, empty lines and
//! delimiter-only lines are both dropped without taking a number.

mod delimited;
mod spreadsheet;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Unsupported file format '{0}'; upload an .xlsx, .xls or .csv file")]
    UnsupportedFormat(String),

    #[error("File could not be read: {0}")]
    Unreadable(String),

    #[error("File has no header row")]
    MissingHeader,

    #[error("File contains no data rows")]
    NoDataRows,

    #[error("File has more than {max} data rows; split it into smaller uploads")]
    TooManyRows { max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    Xlsx,
    Xls,
    Csv,
}

const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

impl TabularFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "xlsx" => Some(TabularFormat::Xlsx),
            "xls" => Some(TabularFormat::Xls),
            "csv" => Some(TabularFormat::Csv),
            _ => None,
        }
    }

    /// Guess the format from the first bytes of a file
    pub fn sniff(head: &[u8]) -> Option<Self> {
        if head.starts_with(&ZIP_MAGIC) {
            return Some(TabularFormat::Xlsx);
        }
        if head.starts_with(&OLE_MAGIC) {
            return Some(TabularFormat::Xls);
        }
        let text = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
        let printable = !text.is_empty()
            && text
                .iter()
                .all(|b| !b.is_ascii_control() || matches!(b, b'\t' | b'\r' | b'\n'));
        // A cut-off multibyte sequence at the end of the sample is still text
        let utf8 = match std::str::from_utf8(text) {
            Ok(_) => true,
            Err(e) => e.error_len().is_none(),
        };
        if printable && utf8 {
            return Some(TabularFormat::Csv);
        }
        None
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TabularFormat::Xlsx => "xlsx",
            TabularFormat::Xls => "xls",
            TabularFormat::Csv => "csv",
        }
    }
}

/// Raw cell content as read from the file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// Build a text cell; whitespace-only text becomes `Empty`
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Cell content coerced to trimmed text; `None` when blank
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(n) => Some(format_number(*n)),
        }
    }
}

/// Integral floats print without a fractional part ("5", not "5.0")
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One data row keyed by normalized header name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRow {
    pub number: usize,
    pub cells: BTreeMap<String, CellValue>,
}

impl RawRow {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            cells: BTreeMap::new(),
        }
    }

    /// Cell for `column`; missing columns read as `Empty`
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).as_text()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }
}

/// Parsed first sheet of an upload
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub format: TabularFormat,
    /// Normalized header names in file order
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

fn normalize_header(raw: &str) -> Option<String> {
    let name = raw.trim_start_matches('\u{feff}').trim().to_lowercase();
    (!name.is_empty()).then_some(name)
}

/// Accumulates rows under a header, enforcing the row limit.
struct SheetBuilder {
    format: TabularFormat,
    /// Column key per position; `None` for blank or duplicate header cells
    columns: Vec<Option<String>>,
    rows: Vec<RawRow>,
    max_rows: usize,
}

impl SheetBuilder {
    fn new<'a>(
        format: TabularFormat,
        header: impl IntoIterator<Item = &'a str>,
        max_rows: usize,
    ) -> Result<Self, ParseError> {
        let mut columns: Vec<Option<String>> = Vec::new();
        for raw in header {
            let key = normalize_header(raw).filter(|k| !columns.iter().flatten().any(|c| c == k));
            columns.push(key);
        }
        if columns.iter().all(Option::is_none) {
            return Err(ParseError::MissingHeader);
        }
        Ok(Self {
            format,
            columns,
            rows: Vec::new(),
            max_rows,
        })
    }

    fn push(
        &mut self,
        number: usize,
        cells: impl IntoIterator<Item = CellValue>,
    ) -> Result<(), ParseError> {
        let mut row = RawRow::new(number);
        for (column, value) in self.columns.iter().zip(cells) {
            if let Some(column) = column {
                row.insert(column.clone(), value);
            }
        }
        if row.is_blank() {
            return Ok(());
        }
        if self.rows.len() >= self.max_rows {
            return Err(ParseError::TooManyRows { max: self.max_rows });
        }
        self.rows.push(row);
        Ok(())
    }

    fn finish(self) -> Result<ParsedSheet, ParseError> {
        if self.rows.is_empty() {
            return Err(ParseError::NoDataRows);
        }
        Ok(ParsedSheet {
            format: self.format,
            headers: self.columns.into_iter().flatten().collect(),
            rows: self.rows,
        })
    }
}

/// Parse the first sheet of the file at `path`.
///
/// Blocking; call from `spawn_blocking` in async contexts.
pub fn parse_file(
    path: &Path,
    format: TabularFormat,
    max_rows: usize,
) -> Result<ParsedSheet, ParseError> {
    match format {
        TabularFormat::Csv => delimited::read_csv(path, max_rows),
        TabularFormat::Xlsx | TabularFormat::Xls => {
            spreadsheet::read_first_sheet(path, format, max_rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_formats() {
        assert_eq!(
            TabularFormat::sniff(&[0x50, 0x4B, 0x03, 0x04, 0x14, 0x00]),
            Some(TabularFormat::Xlsx)
        );
        assert_eq!(TabularFormat::sniff(&OLE_MAGIC), Some(TabularFormat::Xls));
        assert_eq!(
            TabularFormat::sniff(b"name,description,price\n"),
            Some(TabularFormat::Csv)
        );
        assert_eq!(TabularFormat::sniff(&[0x00, 0x01, 0x02, 0xFF]), None);
        assert_eq!(TabularFormat::sniff(b""), None);
    }

    #[test]
    fn test_sniff_accepts_truncated_utf8_tail() {
        let text = "name,описание".as_bytes();
        let cut = &text[..text.len() - 1];
        assert_eq!(TabularFormat::sniff(cut), Some(TabularFormat::Csv));
    }

    #[test]
    fn test_number_cells_coerce_to_text() {
        assert_eq!(CellValue::Number(5.0).as_text().as_deref(), Some("5"));
        assert_eq!(CellValue::Number(99.95).as_text().as_deref(), Some("99.95"));
        assert_eq!(CellValue::text("   ").as_text(), None);
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_missing_column_reads_as_empty() {
        let mut row = RawRow::new(1);
        row.insert("name", CellValue::text("Filter"));
        assert_eq!(row.get("brand"), &CellValue::Empty);
        assert_eq!(row.text("name").as_deref(), Some("Filter"));
    }

    #[test]
    fn test_header_normalization_and_duplicates() {
        let mut builder =
            SheetBuilder::new(TabularFormat::Csv, ["\u{feff}Name", " PRICE ", "", "name"], 10)
                .unwrap();
        builder
            .push(
                1,
                vec![
                    CellValue::text("A"),
                    CellValue::Number(10.0),
                    CellValue::text("ignored"),
                    CellValue::text("B"),
                ],
            )
            .unwrap();
        let sheet = builder.finish().unwrap();
        assert_eq!(sheet.headers, vec!["name", "price"]);
        assert_eq!(sheet.rows[0].text("name").as_deref(), Some("A"));
        assert_eq!(sheet.rows[0].cells.len(), 2);
    }

    #[test]
    fn test_blank_header_is_missing_header() {
        let err = SheetBuilder::new(TabularFormat::Csv, ["", "  "], 10).err();
        assert!(matches!(err, Some(ParseError::MissingHeader)));
    }

    #[test]
    fn test_row_limit() {
        let mut builder = SheetBuilder::new(TabularFormat::Csv, ["name"], 1).unwrap();
        builder.push(1, vec![CellValue::text("a")]).unwrap();
        builder.push(2, vec![CellValue::Empty]).unwrap();
        let err = builder.push(3, vec![CellValue::text("b")]).unwrap_err();
        assert!(matches!(err, ParseError::TooManyRows { max: 1 }));
    }
}
