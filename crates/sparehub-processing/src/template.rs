//! Blank upload template with the canonical header and one example row.
//!
//! Rendered once per format into the template directory and served from there
//! afterwards, so repeated downloads are byte-identical.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tempfile::NamedTempFile;

/// Header row of every upload, in order
pub const TEMPLATE_COLUMNS: [&str; 10] = [
    "name",
    "description",
    "price",
    "category",
    "stock",
    "images",
    "specifications",
    "brand",
    "model",
    "condition",
];

enum ExampleCell {
    Text(&'static str),
    Number(f64),
}

const EXAMPLE_ROW: [ExampleCell; 10] = [
    ExampleCell::Text("Boom lift cylinder JCB 3CX"),
    ExampleCell::Text(
        "Boom lift hydraulic cylinder for JCB 3CX backhoe loaders. Genuine part, 12 month warranty.",
    ),
    ExampleCell::Number(125000.0),
    ExampleCell::Text("Hydraulics"),
    ExampleCell::Number(5.0),
    ExampleCell::Text("cylinder-front.jpg,cylinder-side.jpg"),
    ExampleCell::Text(
        r#"{"article":"331/39024","manufacturer":"JCB","compatibility":["3CX","4CX"],"weight":38.5,"material":"Steel"}"#,
    ),
    ExampleCell::Text("JCB"),
    ExampleCell::Text("3CX"),
    ExampleCell::Text("new"),
];

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("template rendering failed: {0}")]
    Render(String),
}

impl From<XlsxError> for TemplateError {
    fn from(err: XlsxError) -> Self {
        TemplateError::Render(err.to_string())
    }
}

impl From<csv::Error> for TemplateError {
    fn from(err: csv::Error) -> Self {
        TemplateError::Render(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateFormat {
    Csv,
    #[default]
    Xlsx,
}

impl TemplateFormat {
    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateFormat::Csv => "product_template.csv",
            TemplateFormat::Xlsx => "product_template.xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            TemplateFormat::Csv => "text/csv; charset=utf-8",
            TemplateFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl FromStr for TemplateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(TemplateFormat::Csv),
            "xlsx" => Ok(TemplateFormat::Xlsx),
            other => Err(format!(
                "unknown template format '{}' (expected 'xlsx' or 'csv')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    dir: PathBuf,
}

impl TemplateGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, format: TemplateFormat) -> PathBuf {
        self.dir.join(format.file_name())
    }

    /// Template bytes, rendering and caching them on first use.
    ///
    /// Blocking. Concurrent first calls race on `persist_noclobber`; the loser
    /// reads the winner's file.
    pub fn get_or_create(&self, format: TemplateFormat) -> Result<Vec<u8>, TemplateError> {
        let path = self.path_for(format);
        if path.exists() {
            return Ok(fs::read(&path)?);
        }

        fs::create_dir_all(&self.dir)?;
        let bytes = match format {
            TemplateFormat::Csv => render_csv()?,
            TemplateFormat::Xlsx => render_xlsx()?,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                tracing::info!(path = %path.display(), "Upload template created");
                Ok(bytes)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(fs::read(&path)?),
            Err(e) => Err(TemplateError::Io(e.error)),
        }
    }
}

fn render_csv() -> Result<Vec<u8>, TemplateError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TEMPLATE_COLUMNS)?;
    let example: Vec<String> = EXAMPLE_ROW
        .iter()
        .map(|cell| match cell {
            ExampleCell::Text(s) => s.to_string(),
            ExampleCell::Number(n) => n.to_string(),
        })
        .collect();
    writer.write_record(&example)?;
    writer
        .into_inner()
        .map_err(|e| TemplateError::Render(e.to_string()))
}

fn render_xlsx() -> Result<Vec<u8>, TemplateError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Products")?;

    for (col, name) in TEMPLATE_COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *name, &header)?;
        sheet.set_column_width(col, 22)?;
    }
    for (col, cell) in EXAMPLE_ROW.iter().enumerate() {
        let col = col as u16;
        match cell {
            ExampleCell::Text(s) => {
                sheet.write_string(1, col, *s)?;
            }
            ExampleCell::Number(n) => {
                sheet.write_number(1, col, *n)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
