//! Common utilities for file upload handlers

use axum::extract::Multipart;
use sparehub_core::AppError;
use sparehub_processing::UploadedFile;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Stream the multipart field named "file" into a temporary file.
/// Only one field named "file" is accepted; multiple file fields are rejected.
/// Other fields are ignored. The size limit is enforced while streaming.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
    max_size: usize,
    tmp_dir: Option<&Path>,
) -> Result<UploadedFile, AppError> {
    let mut upload: Option<UploadedFile> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        if upload.is_some() {
            return Err(AppError::InvalidInput(
                "Multiple file fields are not allowed; send exactly one field named 'file'"
                    .to_string(),
            ));
        }

        let filename = sanitize_filename(field.file_name().unwrap_or("upload"))?;
        let mut file = match tmp_dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        let mut size: usize = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read file data: {}", e)))?
        {
            size += chunk.len();
            validate_file_size(size, max_size)?;
            file.write_all(&chunk)?;
        }
        file.flush()?;

        upload = Some(UploadedFile::new(file, filename, size as u64));
    }

    upload.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))
}

/// Validate file size
pub fn validate_file_size(file_size: usize, max_size: usize) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Sanitize filename to prevent path traversal and invalid characters.
/// Returns an error if the filename contains path traversal attempts.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    const MAX_FILENAME_LENGTH: usize = 255;

    let path = Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Ok("upload".to_string());
    }

    Ok(sanitized)
}
