//! SpareHub API Library
//!
//! HTTP handlers for bulk product upload, template download and product reads,
//! plus application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod telemetry;
mod utils;

// Public modules
pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
