//! SpareHub bulk product ingestion
//!
//! An uploaded spreadsheet flows through [`tabular`] (rows), [`validator`]
//! (normalized products or per-row errors), [`persister`] (store writes in the
//! chosen [`PersistMode`](sparehub_core::PersistMode)) and [`report`] (summary).
//! [`upload::IngestionPipeline`] ties the stages together and owns the lifetime of
//! the temporary upload file. [`template`] serves the blank upload template.

pub mod identifiers;
pub mod persister;
pub mod report;
pub mod tabular;
pub mod template;
pub mod upload;
pub mod validator;

pub use persister::{BatchPersister, PersistError, PersistOutcome, ValidatedRow};
pub use report::{IngestionReport, ReportBuilder};
pub use tabular::{CellValue, ParseError, ParsedSheet, RawRow, TabularFormat};
pub use template::{TemplateError, TemplateFormat, TemplateGenerator, TEMPLATE_COLUMNS};
pub use upload::{
    IngestionError, IngestionOutcome, IngestionPipeline, IngestionPreview, UploadError,
    UploadValidator, UploadedFile,
};
pub use validator::{validate_row, ValidationError, REQUIRED_FIELDS};
