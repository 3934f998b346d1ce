//! Product store abstraction
//!
//! The ingestion pipeline only talks to [`ProductStore`]. Uniqueness of `sku` and
//! `slug` is the store's responsibility; callers never lock or pre-check.

use async_trait::async_trait;
use sparehub_core::models::{ProductInsert, ProductRecord};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store cannot be reached at all. Always fatal for an upload.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate value violates unique constraint '{constraint}'")]
    UniqueViolation { constraint: String },

    #[error("referenced seller does not exist")]
    UnknownSeller,

    #[error("query failed: {0}")]
    Query(String),
}

impl StoreError {
    /// Whether this error must abort the whole upload
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    /// Plain-language description suitable for a row-level report entry
    pub fn row_message(&self) -> String {
        match self {
            StoreError::UniqueViolation { constraint } if constraint.contains("sku") => {
                "A product with this SKU already exists".to_string()
            }
            StoreError::UniqueViolation { constraint } if constraint.contains("slug") => {
                "A product with the same generated URL already exists; please retry".to_string()
            }
            StoreError::UniqueViolation { .. } => "Duplicate product".to_string(),
            StoreError::UnknownSeller => "Seller account not found".to_string(),
            StoreError::Unavailable(_) => "Product storage is unavailable".to_string(),
            StoreError::Query(_) => "Product could not be saved".to_string(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    StoreError::UniqueViolation {
                        constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    StoreError::UnknownSeller
                } else {
                    StoreError::Query(db_err.message().to_string())
                }
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Failure of an all-or-nothing insert; nothing from the batch was kept.
#[derive(Debug, thiserror::Error)]
#[error("batch insert rolled back: {source}")]
pub struct AtomicInsertError {
    /// Position in the submitted batch of the record that failed, when known
    pub failed_at: Option<usize>,
    #[source]
    pub source: StoreError,
}

impl AtomicInsertError {
    pub fn at(index: usize, source: StoreError) -> Self {
        Self {
            failed_at: Some(index),
            source,
        }
    }

    pub fn whole_batch(source: StoreError) -> Self {
        Self {
            failed_at: None,
            source,
        }
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Liveness of the underlying store
    async fn ping(&self) -> Result<(), StoreError>;

    async fn seller_exists(&self, seller_id: Uuid) -> Result<bool, StoreError>;

    /// Insert one product in its own unit of work
    async fn insert_product(&self, product: ProductInsert) -> Result<ProductRecord, StoreError>;

    /// Insert every product or none of them
    async fn insert_products_atomic(
        &self,
        products: Vec<ProductInsert>,
    ) -> Result<Vec<ProductRecord>, AtomicInsertError>;

    async fn get_product(
        &self,
        seller_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ProductRecord>, StoreError>;

    /// Seller's products, newest first
    async fn list_products(
        &self,
        seller_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_fatal() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_fatal());
        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_row_not_found_is_not_fatal() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_fatal());
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[test]
    fn test_row_message_for_sku_violation() {
        let err = StoreError::UniqueViolation {
            constraint: "products_sku_key".to_string(),
        };
        assert_eq!(err.row_message(), "A product with this SKU already exists");
        assert!(!err.is_fatal());
    }
}
