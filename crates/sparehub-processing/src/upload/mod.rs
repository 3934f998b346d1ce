//! Upload handling: the temporary file, its checks and the end-to-end pipeline.

pub mod pipeline;
pub mod types;
pub mod validator;

pub use pipeline::{IngestionError, IngestionOutcome, IngestionPipeline, IngestionPreview};
pub use types::UploadedFile;
pub use validator::{UploadError, UploadValidator};
