use crate::auth::SellerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_multipart_file;
use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sparehub_core::models::{IngestionProgress, PersistMode};
use sparehub_core::AppError;
use sparehub_processing::RawRow;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BulkUploadQuery {
    /// `isolated` (default) or `transactional`
    #[serde(default)]
    pub mode: Option<String>,
}

/// Response of an isolated-mode upload
#[derive(Debug, Serialize, ToSchema)]
pub struct IsolatedUploadResponse {
    pub message: String,
    pub progress: IngestionProgress,
}

/// Response of a transactional-mode upload
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionalUploadResponse {
    pub success: bool,
    pub message: String,
}

/// Dry-run result of a preview upload
#[derive(Debug, Serialize, ToSchema)]
pub struct PreviewResponse {
    /// Detected file format: xlsx, xls or csv
    pub format: String,
    /// Normalized header columns in file order
    pub headers: Vec<String>,
    /// First data rows as read, keyed by column
    #[schema(value_type = Vec<Object>)]
    pub sample_rows: Vec<RawRow>,
    /// Report as if the file were ingested in isolated mode, without saving anything
    pub progress: IngestionProgress,
}

fn resolve_mode(query: &BulkUploadQuery, default: PersistMode) -> Result<PersistMode, AppError> {
    match query.mode.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => PersistMode::from_str(raw).map_err(AppError::InvalidInput),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/products/bulk-upload",
    tag = "bulk-upload",
    params(
        BulkUploadQuery,
        ("X-Seller-Id" = uuid::Uuid, Header, description = "Authenticated seller")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload processed; row failures are listed in the report", body = IsolatedUploadResponse),
        (status = 400, description = "Missing file or seller, unsupported or malformed file", body = ErrorResponse),
        (status = 404, description = "Seller not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Product storage unavailable", body = ErrorResponse)
    )
)]
pub async fn bulk_upload(
    State(state): State<Arc<AppState>>,
    seller: SellerContext,
    Query(query): Query<BulkUploadQuery>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let mode = resolve_mode(&query, state.config.default_persist_mode())?;
    let upload = extract_multipart_file(
        multipart,
        state.config.max_upload_size_bytes(),
        state.config.ingestion().upload_tmp_dir.as_deref(),
    )
    .await?;

    tracing::info!(
        seller_id = %seller.seller_id,
        mode = %mode,
        filename = %upload.original_filename(),
        size = upload.size(),
        "Bulk upload received"
    );

    let outcome = state
        .pipeline
        .ingest(seller.seller_id, upload, mode)
        .await?;

    let message = outcome.message();
    let response = match mode {
        PersistMode::Isolated => Json(IsolatedUploadResponse {
            message,
            progress: outcome.progress,
        })
        .into_response(),
        PersistMode::Transactional => Json(TransactionalUploadResponse {
            success: outcome.committed,
            message,
        })
        .into_response(),
    };

    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/products/bulk-upload/preview",
    tag = "bulk-upload",
    params(
        ("X-Seller-Id" = uuid::Uuid, Header, description = "Authenticated seller")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Headers, first rows and a dry-run report; nothing is saved", body = PreviewResponse),
        (status = 400, description = "Missing file or seller, unsupported or malformed file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn preview_upload(
    State(state): State<Arc<AppState>>,
    seller: SellerContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_multipart_file(
        multipart,
        state.config.max_upload_size_bytes(),
        state.config.ingestion().upload_tmp_dir.as_deref(),
    )
    .await?;

    tracing::debug!(seller_id = %seller.seller_id, filename = %upload.original_filename(), "Bulk upload preview");

    let preview = state.pipeline.preview(upload).await?;
    Ok(Json(PreviewResponse {
        format: preview.format.extension().to_string(),
        headers: preview.headers,
        sample_rows: preview.sample_rows,
        progress: preview.progress,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mode() {
        let query = |mode: Option<&str>| BulkUploadQuery {
            mode: mode.map(String::from),
        };
        assert_eq!(
            resolve_mode(&query(None), PersistMode::Isolated).unwrap(),
            PersistMode::Isolated
        );
        assert_eq!(
            resolve_mode(&query(Some("transactional")), PersistMode::Isolated).unwrap(),
            PersistMode::Transactional
        );
        assert_eq!(
            resolve_mode(&query(Some("")), PersistMode::Transactional).unwrap(),
            PersistMode::Transactional
        );
        assert!(resolve_mode(&query(Some("yolo")), PersistMode::Isolated).is_err());
    }
}
