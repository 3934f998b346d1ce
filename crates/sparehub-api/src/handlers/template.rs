use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use sparehub_core::AppError;
use sparehub_processing::TemplateFormat;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TemplateQuery {
    /// `xlsx` (default) or `csv`
    #[serde(default)]
    pub format: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/products/bulk-upload/template",
    tag = "bulk-upload",
    params(TemplateQuery),
    responses(
        (status = 200, description = "Upload template with the header row and one example row", content_type = "application/octet-stream"),
        (status = 400, description = "Unknown format", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_template(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let format = match query.format.as_deref() {
        None => TemplateFormat::default(),
        Some(raw) => raw.parse::<TemplateFormat>().map_err(AppError::InvalidInput)?,
    };

    let templates = state.templates.clone();
    let bytes = tokio::task::spawn_blocking(move || templates.get_or_create(format))
        .await
        .map_err(|e| AppError::Internal(format!("Template task failed: {}", e)))??;

    let disposition = format!("attachment; filename=\"{}\"", format.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
