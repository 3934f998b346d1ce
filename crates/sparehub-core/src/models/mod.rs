//! Data models shared across crates

mod ingestion;
mod product;

pub use ingestion::*;
pub use product::*;
