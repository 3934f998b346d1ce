//! In-memory [`ProductStore`] mirroring the Postgres constraints
//!
//! Enforces the same unique keys as the `products` table (`products_sku_key`,
//! `products_slug_key`) and the seller foreign key, so pipeline tests observe the
//! same row-level failures they would against a database.

use async_trait::async_trait;
use chrono::Utc;
use sparehub_core::models::{ProductInsert, ProductRecord};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::db::{AtomicInsertError, ProductStore, StoreError};

#[derive(Default)]
struct State {
    sellers: HashSet<Uuid>,
    products: Vec<ProductRecord>,
    unavailable: bool,
    /// Remaining successful inserts before the store goes down
    inserts_before_outage: Option<usize>,
}

impl State {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    /// Counts down the simulated outage; returns an error once it is reached.
    fn consume_insert_budget(&mut self) -> Result<(), StoreError> {
        if let Some(remaining) = self.inserts_before_outage {
            if remaining == 0 {
                self.unavailable = true;
                return Err(StoreError::Unavailable("connection reset".to_string()));
            }
            self.inserts_before_outage = Some(remaining - 1);
        }
        Ok(())
    }

    fn check_constraints(
        &self,
        insert: &ProductInsert,
        pending: &[ProductRecord],
    ) -> Result<(), StoreError> {
        if !self.sellers.contains(&insert.seller_id) {
            return Err(StoreError::UnknownSeller);
        }
        let existing = self.products.iter().chain(pending.iter());
        for product in existing {
            if product.sku == insert.sku {
                return Err(StoreError::UniqueViolation {
                    constraint: "products_sku_key".to_string(),
                });
            }
            if product.slug == insert.slug {
                return Err(StoreError::UniqueViolation {
                    constraint: "products_slug_key".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_seller(&self, seller_id: Uuid) {
        self.state.lock().unwrap().sellers.insert(seller_id);
    }

    /// Simulate the store going down (or coming back)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    /// Let `count` more inserts succeed, then fail every call as unavailable
    pub fn fail_after_inserts(&self, count: usize) {
        self.state.lock().unwrap().inserts_before_outage = Some(count);
    }

    pub fn product_count(&self) -> usize {
        self.state.lock().unwrap().products.len()
    }

    pub fn products(&self) -> Vec<ProductRecord> {
        self.state.lock().unwrap().products.clone()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.state.lock().unwrap().check_available()
    }

    async fn seller_exists(&self, seller_id: Uuid) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state.sellers.contains(&seller_id))
    }

    async fn insert_product(&self, product: ProductInsert) -> Result<ProductRecord, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.check_available()?;
        state.consume_insert_budget()?;
        state.check_constraints(&product, &[])?;

        let record = ProductRecord::from_insert(product, Uuid::new_v4(), Utc::now());
        state.products.push(record.clone());
        Ok(record)
    }

    async fn insert_products_atomic(
        &self,
        products: Vec<ProductInsert>,
    ) -> Result<Vec<ProductRecord>, AtomicInsertError> {
        let mut state = self.state.lock().unwrap();
        state.check_available().map_err(AtomicInsertError::whole_batch)?;

        let mut pending: Vec<ProductRecord> = Vec::with_capacity(products.len());
        for (index, product) in products.into_iter().enumerate() {
            state
                .consume_insert_budget()
                .map_err(|e| AtomicInsertError::at(index, e))?;
            state
                .check_constraints(&product, &pending)
                .map_err(|e| AtomicInsertError::at(index, e))?;
            pending.push(ProductRecord::from_insert(
                product,
                Uuid::new_v4(),
                Utc::now(),
            ));
        }

        state.products.extend(pending.iter().cloned());
        Ok(pending)
    }

    async fn get_product(
        &self,
        seller_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state
            .products
            .iter()
            .find(|p| p.seller_id == seller_id && p.id == id)
            .cloned())
    }

    async fn list_products(
        &self,
        seller_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        state.check_available()?;
        Ok(state
            .products
            .iter()
            .rev()
            .filter(|p| p.seller_id == seller_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use sparehub_core::models::{Condition, NewProduct, Specifications};

    fn insert(seller_id: Uuid, sku: &str, slug: &str) -> ProductInsert {
        ProductInsert {
            seller_id,
            slug: slug.to_string(),
            sku: sku.to_string(),
            product: NewProduct {
                name: "Hydraulic cylinder".to_string(),
                description: "Boom cylinder for backhoe loaders".to_string(),
                price: Decimal::new(125000, 2),
                category: "Hydraulics".to_string(),
                stock: 3,
                brand: "JCB".to_string(),
                model: "3CX".to_string(),
                condition: Condition::New,
                specifications: Specifications {
                    article: "331/39024".to_string(),
                    manufacturer: "JCB".to_string(),
                    compatibility: vec!["3CX".to_string()],
                    dimensions: None,
                    weight: None,
                    material: None,
                    extra: Default::default(),
                },
                images: vec![],
                sku: None,
            },
        }
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let store = InMemoryProductStore::new();
        let seller = Uuid::new_v4();
        store.add_seller(seller);

        store.insert_product(insert(seller, "SP-1", "a")).await.unwrap();
        let err = store
            .insert_product(insert(seller, "SP-1", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { ref constraint } if constraint == "products_sku_key"));
        assert_eq!(store.product_count(), 1);
    }

    #[tokio::test]
    async fn test_atomic_batch_keeps_nothing_on_conflict() {
        let store = InMemoryProductStore::new();
        let seller = Uuid::new_v4();
        store.add_seller(seller);

        let batch = vec![
            insert(seller, "SP-1", "a"),
            insert(seller, "SP-2", "b"),
            insert(seller, "SP-1", "c"),
        ];
        let err = store.insert_products_atomic(batch).await.unwrap_err();
        assert_eq!(err.failed_at, Some(2));
        assert_eq!(store.product_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_seller_is_rejected() {
        let store = InMemoryProductStore::new();
        let err = store
            .insert_product(insert(Uuid::new_v4(), "SP-1", "a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownSeller));
    }

    #[tokio::test]
    async fn test_outage_after_inserts() {
        let store = InMemoryProductStore::new();
        let seller = Uuid::new_v4();
        store.add_seller(seller);
        store.fail_after_inserts(1);

        assert!(store.insert_product(insert(seller, "SP-1", "a")).await.is_ok());
        let err = store
            .insert_product(insert(seller, "SP-2", "b"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_list_products_is_seller_scoped_newest_first() {
        let store = InMemoryProductStore::new();
        let seller = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.add_seller(seller);
        store.add_seller(other);

        store.insert_product(insert(seller, "SP-1", "a")).await.unwrap();
        store.insert_product(insert(other, "SP-2", "b")).await.unwrap();
        store.insert_product(insert(seller, "SP-3", "c")).await.unwrap();

        let listed = store.list_products(seller, 10, 0).await.unwrap();
        let skus: Vec<_> = listed.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["SP-3", "SP-1"]);
    }
}
