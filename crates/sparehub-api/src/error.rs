//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors from the
//! pipeline, the store and the template generator convert into [`AppError`] here so
//! every failure renders with the same status mapping, body shape and logging.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sparehub_core::{AppError, ErrorMetadata, LogLevel};
use sparehub_db::StoreError;
use sparehub_processing::{IngestionError, ParseError, TemplateError, UploadError};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client (e.g., "Split the file into smaller uploads")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rule: IntoResponse and AppError both live in other crates)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;
        let is_production = is_production_env();

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details only outside production and only for non-sensitive errors
        let show_details = !is_production && !app_error.is_sensitive();
        let body = ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        };

        (status, Json(body)).into_response()
    }
}

// Convert domain errors to HttpAppError (avoids orphan rule: we impl for local HttpAppError)

impl From<UploadError> for HttpAppError {
    fn from(err: UploadError) -> Self {
        let app = match err {
            UploadError::FileTooLarge { max, .. } => AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                max / 1024 / 1024
            )),
            UploadError::InvalidExtension { extension, allowed } => {
                AppError::InvalidInput(format!(
                    "Unsupported file type '.{}'; allowed: {}",
                    extension,
                    allowed.join(", ")
                ))
            }
            UploadError::InvalidFilename(name) => {
                AppError::InvalidInput(format!("Invalid filename: {}", name))
            }
            UploadError::EmptyFile => AppError::InvalidInput("File is empty".to_string()),
            err @ UploadError::UnrecognizedFormat => AppError::InvalidInput(err.to_string()),
            UploadError::Io(err) => AppError::Internal(format!("IO error: {}", err)),
        };
        HttpAppError(app)
    }
}

impl From<ParseError> for HttpAppError {
    fn from(err: ParseError) -> Self {
        HttpAppError(AppError::Parse(err.to_string()))
    }
}

impl From<IngestionError> for HttpAppError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Upload(e) => e.into(),
            IngestionError::Parse(e) => e.into(),
            IngestionError::UnknownSeller(id) => {
                HttpAppError(AppError::NotFound(format!("Seller {} not found", id)))
            }
            IngestionError::StoreUnavailable { saved: 0, source } => {
                HttpAppError(AppError::StoreUnavailable(source.to_string()))
            }
            IngestionError::StoreUnavailable { saved, source } => {
                HttpAppError(AppError::StoreInterrupted {
                    saved,
                    reason: source.to_string(),
                })
            }
            IngestionError::Internal(msg) => HttpAppError(AppError::Internal(msg)),
        }
    }
}

impl From<StoreError> for HttpAppError {
    fn from(err: StoreError) -> Self {
        let app = match err {
            StoreError::Unavailable(msg) => AppError::StoreUnavailable(msg),
            StoreError::UnknownSeller => AppError::NotFound("Seller not found".to_string()),
            other => AppError::Internal(other.to_string()),
        };
        HttpAppError(app)
    }
}

impl From<TemplateError> for HttpAppError {
    fn from(err: TemplateError) -> Self {
        HttpAppError(AppError::Internal(format!(
            "Template generation failed: {}",
            err
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_from_upload_error_file_too_large() {
        let err = UploadError::FileTooLarge {
            size: 20 * 1024 * 1024,
            max: 10 * 1024 * 1024,
        };
        let HttpAppError(app_err) = err.into();
        match app_err {
            AppError::PayloadTooLarge(msg) => assert!(msg.contains("10 MB")),
            _ => panic!("Expected PayloadTooLarge variant"),
        }
    }

    #[test]
    fn test_from_upload_error_invalid_extension() {
        let err = UploadError::InvalidExtension {
            extension: "pdf".to_string(),
            allowed: vec!["xlsx".to_string(), "csv".to_string()],
        };
        let HttpAppError(app_err) = err.into();
        match app_err {
            AppError::InvalidInput(msg) => {
                assert!(msg.contains("pdf"));
                assert!(msg.contains("xlsx"));
            }
            _ => panic!("Expected InvalidInput variant"),
        }
    }

    #[test]
    fn test_from_parse_error_is_bad_request() {
        let HttpAppError(app_err) = ParseError::NoDataRows.into();
        assert_eq!(app_err.http_status_code(), 400);
        assert_eq!(app_err.client_message(), "File contains no data rows");
    }

    #[test]
    fn test_from_ingestion_error_unknown_seller() {
        let HttpAppError(app_err) = IngestionError::UnknownSeller(Uuid::nil()).into();
        assert_eq!(app_err.http_status_code(), 404);
    }

    #[test]
    fn test_from_ingestion_error_store_unavailable() {
        let err = IngestionError::StoreUnavailable {
            saved: 0,
            source: StoreError::Unavailable("connection refused".to_string()),
        };
        let HttpAppError(app_err) = err.into();
        assert_eq!(app_err.http_status_code(), 500);
        assert!(app_err.is_sensitive());
        assert!(app_err.client_message().contains("no products were saved"));
    }

    #[test]
    fn test_from_ingestion_error_store_lost_mid_upload() {
        let err = IngestionError::StoreUnavailable {
            saved: 3,
            source: StoreError::Unavailable("connection reset".to_string()),
        };
        let HttpAppError(app_err) = err.into();
        assert!(matches!(app_err, AppError::StoreInterrupted { saved: 3, .. }));
        assert_eq!(app_err.http_status_code(), 500);
        assert!(app_err.client_message().contains("after 3 products were saved"));
    }

    #[test]
    fn test_from_store_error_query_is_internal() {
        let HttpAppError(app_err) = StoreError::Query("syntax error".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    /// Serialized ErrorResponse has "error", "code", "recoverable", and optionally
    /// "details" / "error_type" / "suggested_action".
    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse {
            error: "Seller identity is required".to_string(),
            details: None,
            error_type: Some("BadRequest".to_string()),
            code: "BAD_REQUEST".to_string(),
            recoverable: false,
            suggested_action: None,
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert!(json.get("error").and_then(|v| v.as_str()).is_some());
        assert_eq!(json.get("code").and_then(|v| v.as_str()), Some("BAD_REQUEST"));
        assert!(json.get("recoverable").and_then(|v| v.as_bool()).is_some());
        assert!(json.get("details").is_none());
    }
}
