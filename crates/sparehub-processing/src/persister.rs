//! Batch persister: writes validated rows in the requested [`PersistMode`].

use sparehub_core::models::{NewProduct, PersistMode, ProductInsert};
use sparehub_db::{ProductStore, StoreError};
use std::sync::Arc;
use uuid::Uuid;

use crate::identifiers::{new_sku, new_slug};

/// A row that passed validation, tagged with its 1-based data row number
#[derive(Debug, Clone)]
pub struct ValidatedRow {
    pub row: usize,
    pub product: NewProduct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRow {
    pub row: usize,
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    pub row: usize,
    pub reason: String,
}

/// Result of a completed persist call
#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub persisted: Vec<PersistedRow>,
    /// Always empty in transactional mode
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The store went away; `saved` rows were committed before it did
    #[error("product store unavailable after {saved} rows were saved")]
    StoreUnavailable {
        saved: usize,
        #[source]
        source: StoreError,
    },

    /// Transactional batch rolled back because of one row
    #[error("Row {row}: {reason}")]
    RowAborted { row: usize, reason: String },

    /// Transactional batch rolled back without a row to blame
    #[error("{0}")]
    BatchAborted(String),
}

pub struct BatchPersister {
    store: Arc<dyn ProductStore>,
}

impl BatchPersister {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    /// Write `rows` for `seller_id`.
    ///
    /// Isolated mode inserts sequentially in row order; a failing row becomes a
    /// [`RowFailure`] and the next row is attempted. An unavailable store aborts
    /// either mode with [`PersistError::StoreUnavailable`].
    #[tracing::instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn persist(
        &self,
        seller_id: Uuid,
        mode: PersistMode,
        rows: Vec<ValidatedRow>,
    ) -> Result<PersistOutcome, PersistError> {
        match mode {
            PersistMode::Isolated => self.persist_isolated(seller_id, rows).await,
            PersistMode::Transactional => self.persist_transactional(seller_id, rows).await,
        }
    }

    async fn persist_isolated(
        &self,
        seller_id: Uuid,
        rows: Vec<ValidatedRow>,
    ) -> Result<PersistOutcome, PersistError> {
        let mut outcome = PersistOutcome::default();

        for ValidatedRow { row, product } in rows {
            match self.store.insert_product(prepare(seller_id, product)).await {
                Ok(record) => outcome.persisted.push(PersistedRow { row, id: record.id }),
                Err(e) if e.is_fatal() => {
                    let saved = outcome.persisted.len();
                    tracing::error!(row, saved, error = %e, "Store unavailable during bulk insert");
                    return Err(PersistError::StoreUnavailable { saved, source: e });
                }
                Err(e) => {
                    tracing::debug!(row, error = %e, "Row insert rejected by store");
                    outcome.failures.push(RowFailure {
                        row,
                        reason: e.row_message(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    async fn persist_transactional(
        &self,
        seller_id: Uuid,
        rows: Vec<ValidatedRow>,
    ) -> Result<PersistOutcome, PersistError> {
        let row_numbers: Vec<usize> = rows.iter().map(|r| r.row).collect();
        let inserts: Vec<ProductInsert> = rows
            .into_iter()
            .map(|r| prepare(seller_id, r.product))
            .collect();

        match self.store.insert_products_atomic(inserts).await {
            Ok(records) => Ok(PersistOutcome {
                persisted: row_numbers
                    .into_iter()
                    .zip(records)
                    .map(|(row, record)| PersistedRow { row, id: record.id })
                    .collect(),
                failures: Vec::new(),
            }),
            Err(e) if e.source.is_fatal() => Err(PersistError::StoreUnavailable {
                saved: 0,
                source: e.source,
            }),
            Err(e) => {
                let reason = e.source.row_message();
                match e.failed_at.and_then(|i| row_numbers.get(i)) {
                    Some(&row) => Err(PersistError::RowAborted { row, reason }),
                    None => Err(PersistError::BatchAborted(reason)),
                }
            }
        }
    }
}

fn prepare(seller_id: Uuid, product: NewProduct) -> ProductInsert {
    ProductInsert {
        seller_id,
        slug: new_slug(&product.name),
        sku: product.sku.clone().unwrap_or_else(new_sku),
        product,
    }
}
