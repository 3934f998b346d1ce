//! Ingestion pipeline: validate upload → parse → validate rows → persist → report.
//!
//! The pipeline owns the [`UploadedFile`] it is given and deletes it on every
//! path out, including early rejections and parser failures. Row validation and
//! isolated-mode inserts run sequentially, so report rows come out in file order.

use serde::Serialize;
use sparehub_core::models::{IngestionProgress, PersistMode};
use sparehub_core::IngestionConfig;
use sparehub_db::{ProductStore, StoreError};
use std::sync::Arc;
use uuid::Uuid;

use super::types::UploadedFile;
use super::validator::{UploadError, UploadValidator};
use crate::persister::{BatchPersister, PersistError, ValidatedRow};
use crate::report::{IngestionReport, ReportBuilder};
use crate::tabular::{parse_file, ParseError, ParsedSheet, RawRow, TabularFormat};
use crate::validator::{validate_row, ValidationError};

/// Rows echoed back by [`IngestionPipeline::preview`]
const PREVIEW_ROWS: usize = 5;

/// Failures that end an upload without a row report
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("seller {0} not found")]
    UnknownSeller(Uuid),

    /// `saved` products were committed before the store went away
    #[error("product store unavailable after {saved} products were saved")]
    StoreUnavailable {
        saved: usize,
        #[source]
        source: StoreError,
    },

    #[error("internal ingestion error: {0}")]
    Internal(String),
}

impl From<PersistError> for IngestionError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::StoreUnavailable { saved, source } => {
                IngestionError::StoreUnavailable { saved, source }
            }
            other => IngestionError::Internal(other.to_string()),
        }
    }
}

/// Result of a completed upload
#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    pub mode: PersistMode,
    pub progress: IngestionProgress,
    /// Ids of stored products, in row order
    pub product_ids: Vec<Uuid>,
    /// Whether any product was written
    pub committed: bool,
}

impl IngestionOutcome {
    fn from_report(mode: PersistMode, report: IngestionReport) -> Self {
        Self {
            mode,
            committed: !report.product_ids.is_empty(),
            progress: report.progress,
            product_ids: report.product_ids,
        }
    }

    /// One-line summary for the seller
    pub fn message(&self) -> String {
        let p = &self.progress;
        match self.mode {
            PersistMode::Isolated if p.failed == 0 => {
                format!("Upload complete: {} products added", p.success)
            }
            PersistMode::Isolated => format!(
                "Upload complete: {} of {} products added, {} rows failed",
                p.success, p.total, p.failed
            ),
            PersistMode::Transactional if self.committed => {
                format!("Upload complete: all {} products added", p.success)
            }
            PersistMode::Transactional => p
                .errors
                .first()
                .cloned()
                .unwrap_or_else(|| "Import cancelled; no products were saved".to_string()),
        }
    }
}

/// Dry run over an upload: what would be read and how each row fares
#[derive(Debug, Clone, Serialize)]
pub struct IngestionPreview {
    pub format: TabularFormat,
    pub headers: Vec<String>,
    pub sample_rows: Vec<RawRow>,
    pub progress: IngestionProgress,
}

pub struct IngestionPipeline {
    store: Arc<dyn ProductStore>,
    persister: BatchPersister,
    validator: UploadValidator,
    max_rows: usize,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn ProductStore>, config: &IngestionConfig) -> Self {
        Self {
            persister: BatchPersister::new(store.clone()),
            store,
            validator: UploadValidator::new(
                config.max_upload_size_bytes as u64,
                config.allowed_extensions.clone(),
            ),
            max_rows: config.max_import_rows,
        }
    }

    /// Ingest one upload for `seller_id`.
    ///
    /// Row failures are reported in the outcome; only upload, parse, seller and
    /// store-availability failures are returned as errors.
    #[tracing::instrument(skip(self, upload), fields(filename = %upload.original_filename(), size = upload.size()))]
    pub async fn ingest(
        &self,
        seller_id: Uuid,
        upload: UploadedFile,
        mode: PersistMode,
    ) -> Result<IngestionOutcome, IngestionError> {
        let format = match self.precheck(seller_id, &upload).await {
            Ok(format) => format,
            Err(e) => {
                upload.cleanup();
                return Err(e);
            }
        };

        let sheet = self.parse(upload, format).await?;
        let total = sheet.rows.len();
        let (valid, invalid) = validate_rows(&sheet.rows);

        let outcome = match mode {
            PersistMode::Isolated => {
                let mut report = ReportBuilder::new(total);
                for (row, err) in &invalid {
                    report.record_failure(*row, err);
                }
                let persisted = self.persister.persist(seller_id, mode, valid).await?;
                for row in persisted.persisted {
                    report.record_inserted(row.row, row.id);
                }
                for failure in persisted.failures {
                    report.record_failure(failure.row, failure.reason);
                }
                IngestionOutcome::from_report(mode, report.build())
            }
            PersistMode::Transactional => {
                let report = self.ingest_transactional(seller_id, total, valid, &invalid).await?;
                IngestionOutcome::from_report(mode, report)
            }
        };

        tracing::info!(
            seller_id = %seller_id,
            mode = %mode,
            total = outcome.progress.total,
            success = outcome.progress.success,
            failed = outcome.progress.failed,
            "Bulk upload processed"
        );

        Ok(outcome)
    }

    /// All-or-nothing: a single invalid row cancels the import before the store is touched.
    async fn ingest_transactional(
        &self,
        seller_id: Uuid,
        total: usize,
        valid: Vec<ValidatedRow>,
        invalid: &[(usize, ValidationError)],
    ) -> Result<IngestionReport, IngestionError> {
        if let Some((row, err)) = invalid.first() {
            let reason = format!(
                "Import cancelled: Row {}: {} ({} of {} rows failed validation); no products were saved",
                row,
                err,
                invalid.len(),
                total
            );
            return Ok(ReportBuilder::aborted(total, reason));
        }

        match self
            .persister
            .persist(seller_id, PersistMode::Transactional, valid)
            .await
        {
            Ok(outcome) => {
                let mut report = ReportBuilder::new(total);
                for row in outcome.persisted {
                    report.record_inserted(row.row, row.id);
                }
                Ok(report.build())
            }
            Err(e @ PersistError::StoreUnavailable { .. }) => Err(e.into()),
            Err(aborted) => {
                tracing::warn!(seller_id = %seller_id, reason = %aborted, "Transactional import rolled back");
                Ok(ReportBuilder::aborted(
                    total,
                    format!("Import cancelled: {}; no products were saved", aborted),
                ))
            }
        }
    }

    /// Parse and validate without writing anything.
    pub async fn preview(&self, upload: UploadedFile) -> Result<IngestionPreview, IngestionError> {
        let format = match self.validator.validate(&upload) {
            Ok(format) => format,
            Err(e) => {
                upload.cleanup();
                return Err(e.into());
            }
        };

        let sheet = self.parse(upload, format).await?;
        let mut report = ReportBuilder::new(sheet.rows.len());
        for row in &sheet.rows {
            match validate_row(row) {
                Ok(_) => report.record_accepted(row.number),
                Err(e) => report.record_failure(row.number, e),
            }
        }

        Ok(IngestionPreview {
            format: sheet.format,
            sample_rows: sheet.rows.into_iter().take(PREVIEW_ROWS).collect(),
            headers: sheet.headers,
            progress: report.build().progress,
        })
    }

    async fn precheck(
        &self,
        seller_id: Uuid,
        upload: &UploadedFile,
    ) -> Result<TabularFormat, IngestionError> {
        let format = self.validator.validate(upload)?;
        match self.store.seller_exists(seller_id).await {
            Ok(true) => Ok(format),
            Ok(false) => Err(IngestionError::UnknownSeller(seller_id)),
            Err(e) if e.is_fatal() => Err(IngestionError::StoreUnavailable {
                saved: 0,
                source: e,
            }),
            Err(e) => Err(IngestionError::Internal(e.to_string())),
        }
    }

    /// Parse on the blocking pool; the upload is deleted once the parser is done with it.
    async fn parse(
        &self,
        upload: UploadedFile,
        format: TabularFormat,
    ) -> Result<ParsedSheet, IngestionError> {
        let max_rows = self.max_rows;
        let sheet = tokio::task::spawn_blocking(move || {
            let result = parse_file(upload.path(), format, max_rows);
            upload.cleanup();
            result
        })
        .await
        .map_err(|e| IngestionError::Internal(format!("parser task failed: {}", e)))??;

        tracing::debug!(
            format = sheet.format.extension(),
            rows = sheet.rows.len(),
            "Upload parsed"
        );
        Ok(sheet)
    }
}

fn validate_rows(rows: &[RawRow]) -> (Vec<ValidatedRow>, Vec<(usize, ValidationError)>) {
    let mut valid = Vec::with_capacity(rows.len());
    let mut invalid = Vec::new();
    for row in rows {
        match validate_row(row) {
            Ok(product) => valid.push(ValidatedRow {
                row: row.number,
                product,
            }),
            Err(e) => {
                tracing::debug!(row = row.number, reason = %e, "Row rejected by validation");
                invalid.push((row.number, e));
            }
        }
    }
    (valid, invalid)
}
