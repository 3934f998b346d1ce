//! SpareHub Core Library
//!
//! This crate provides the domain models, error types and configuration shared
//! by the ingestion pipeline, the persistence layer and the HTTP API.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{AppConfig, Config, IngestionConfig, ServerConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{IngestionProgress, PersistMode};
