use crate::tabular::TabularFormat;

use super::types::UploadedFile;

/// Bytes read from the start of an upload to guess its format
const SNIFF_LEN: usize = 512;

/// Upload-level rejection, raised before any row is parsed
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("File type could not be recognized; upload an .xlsx, .xls or .csv file")]
    UnrecognizedFormat,

    #[error("Upload could not be read: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload file validator
///
/// Checks size and type of an uploaded spreadsheet and decides which parser reads it.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
}

impl UploadValidator {
    pub fn new(max_file_size: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn validate_file_size(&self, size: u64) -> Result<(), UploadError> {
        if size == 0 {
            return Err(UploadError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    fn check_allowed(&self, extension: &str) -> Result<(), UploadError> {
        if !self.allowed_extensions.iter().any(|e| e == extension) {
            return Err(UploadError::InvalidExtension {
                extension: extension.to_string(),
                allowed: self.allowed_extensions.clone(),
            });
        }
        Ok(())
    }

    /// Validate the upload and pick its format.
    ///
    /// The filename extension decides when present; otherwise the first bytes are
    /// sniffed. Either way the result must be on the allowlist.
    pub fn validate(&self, upload: &UploadedFile) -> Result<TabularFormat, UploadError> {
        self.validate_file_size(upload.size())?;

        if upload.original_filename().contains("..") {
            return Err(UploadError::InvalidFilename(
                upload.original_filename().to_string(),
            ));
        }

        let format = match upload.extension() {
            Some(extension) => {
                self.check_allowed(&extension)?;
                TabularFormat::from_extension(&extension).ok_or(UploadError::InvalidExtension {
                    extension,
                    allowed: self.allowed_extensions.clone(),
                })?
            }
            None => {
                let head = upload.read_head(SNIFF_LEN)?;
                let format =
                    TabularFormat::sniff(&head).ok_or(UploadError::UnrecognizedFormat)?;
                self.check_allowed(format.extension())?;
                tracing::debug!(
                    filename = %upload.original_filename(),
                    format = format.extension(),
                    "Upload format detected from content"
                );
                format
            }
        };

        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UploadValidator {
        UploadValidator::new(
            64,
            vec!["xlsx".to_string(), "xls".to_string(), "csv".to_string()],
        )
    }

    fn upload(name: &str, bytes: &[u8]) -> UploadedFile {
        UploadedFile::from_bytes_in(None, name, bytes).unwrap()
    }

    #[test]
    fn test_extension_decides_format() {
        let format = validator().validate(&upload("Parts.CSV", b"name\n")).unwrap();
        assert_eq!(format, TabularFormat::Csv);
        let format = validator().validate(&upload("parts.xls", b"\0")).unwrap();
        assert_eq!(format, TabularFormat::Xls);
    }

    #[test]
    fn test_size_limits() {
        assert!(matches!(
            validator().validate(&upload("a.csv", b"")),
            Err(UploadError::EmptyFile)
        ));
        assert!(matches!(
            validator().validate(&upload("a.csv", &[b'a'; 65])),
            Err(UploadError::FileTooLarge { size: 65, max: 64 })
        ));
    }

    #[test]
    fn test_disallowed_extension() {
        let err = validator().validate(&upload("parts.pdf", b"%PDF")).unwrap_err();
        assert!(matches!(err, UploadError::InvalidExtension { ref extension, .. } if extension == "pdf"));

        let csv_only = UploadValidator::new(64, vec!["csv".to_string()]);
        assert!(csv_only.validate(&upload("parts.xlsx", b"PK")).is_err());
    }

    #[test]
    fn test_missing_extension_is_sniffed() {
        let format = validator()
            .validate(&upload("blob", b"name,price\nFilter,10\n"))
            .unwrap();
        assert_eq!(format, TabularFormat::Csv);

        let err = validator()
            .validate(&upload("blob", &[0x00, 0x01, 0xFF]))
            .unwrap_err();
        assert!(matches!(err, UploadError::UnrecognizedFormat));
    }

    #[test]
    fn test_path_traversal_filename() {
        assert!(matches!(
            validator().validate(&upload("../../etc/parts.csv", b"a")),
            Err(UploadError::InvalidFilename(_))
        ));
    }
}
