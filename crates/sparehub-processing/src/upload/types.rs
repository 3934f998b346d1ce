//! Types for the upload pipeline.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// An uploaded file spooled to disk.
///
/// The backing file is removed when this value is dropped or [`cleanup`](Self::cleanup)
/// is called, whichever comes first.
#[derive(Debug)]
pub struct UploadedFile {
    file: NamedTempFile,
    original_filename: String,
    size: u64,
}

impl UploadedFile {
    pub fn new(file: NamedTempFile, original_filename: impl Into<String>, size: u64) -> Self {
        Self {
            file,
            original_filename: original_filename.into(),
            size,
        }
    }

    /// Spool `bytes` into a new temporary file under `dir` (system temp dir if `None`)
    pub fn from_bytes_in(
        dir: Option<&Path>,
        original_filename: impl Into<String>,
        bytes: &[u8],
    ) -> io::Result<Self> {
        let mut file = match dir {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self::new(file, original_filename, bytes.len() as u64))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lower-cased extension of the original filename, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .filter(|e| !e.is_empty())
    }

    /// Up to `n` leading bytes, for format sniffing
    pub fn read_head(&self, n: usize) -> io::Result<Vec<u8>> {
        let mut head = Vec::with_capacity(n);
        File::open(self.path())?
            .take(n as u64)
            .read_to_end(&mut head)?;
        Ok(head)
    }

    /// Delete the backing file now, logging instead of failing
    pub fn cleanup(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload temp file");
        }
    }
}
