//! SpareHub persistence layer
//!
//! [`ProductStore`] is the seam between the ingestion pipeline and storage. The
//! Postgres implementation lives in [`db`]; an in-memory implementation for tests
//! is available behind the `test-helpers` feature.

pub mod db;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::{
    AtomicInsertError, ProductRepository, ProductStore, StoreError, TransactionGuard,
};
