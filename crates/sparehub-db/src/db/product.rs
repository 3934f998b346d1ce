use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sparehub_core::models::{
    Condition, NewProduct, ProductInsert, ProductRecord, Specifications,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres};
use uuid::Uuid;

use super::store::{AtomicInsertError, ProductStore, StoreError};
use super::transaction::TransactionGuard;

const PRODUCT_COLUMNS: &str = "id, seller_id, name, slug, sku, description, price, category, \
     stock, brand, model, condition, specifications, images, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    seller_id: Uuid,
    name: String,
    slug: String,
    sku: String,
    description: String,
    price: Decimal,
    category: String,
    stock: i32,
    brand: String,
    model: String,
    condition: String,
    specifications: Json<Specifications>,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let condition = row
            .condition
            .parse::<Condition>()
            .map_err(|e| StoreError::Query(format!("product {}: {}", row.id, e)))?;
        Ok(ProductRecord {
            id: row.id,
            seller_id: row.seller_id,
            name: row.name,
            slug: row.slug,
            sku: row.sku,
            description: row.description,
            price: row.price,
            category: row.category,
            stock: row.stock,
            brand: row.brand,
            model: row.model,
            condition,
            specifications: row.specifications.0,
            images: row.images,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

async fn insert_one<'e, E>(executor: E, insert: &ProductInsert) -> Result<ProductRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let NewProduct {
        name,
        description,
        price,
        category,
        stock,
        brand,
        model,
        condition,
        specifications,
        images,
        ..
    } = &insert.product;

    let sql = format!(
        r#"
        INSERT INTO products
            (seller_id, name, slug, sku, description, price, category, stock,
             brand, model, condition, specifications, images)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    );

    sqlx::query_as::<Postgres, ProductRow>(&sql)
        .bind(insert.seller_id)
        .bind(name)
        .bind(&insert.slug)
        .bind(&insert.sku)
        .bind(description)
        .bind(price)
        .bind(category)
        .bind(stock)
        .bind(brand)
        .bind(model)
        .bind(condition.as_str())
        .bind(Json(specifications))
        .bind(images)
        .fetch_one(executor)
        .await
}

/// Postgres-backed product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "sellers", db.operation = "select"))]
    async fn seller_exists(&self, seller_id: Uuid) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM sellers WHERE id = $1)",
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(
        skip(self, product),
        fields(db.table = "products", db.operation = "insert", sku = %product.sku)
    )]
    async fn insert_product(&self, product: ProductInsert) -> Result<ProductRecord, StoreError> {
        let row = insert_one(&self.pool, &product).await?;
        row.try_into()
    }

    #[tracing::instrument(
        skip(self, products),
        fields(db.table = "products", db.operation = "insert", batch_size = products.len())
    )]
    async fn insert_products_atomic(
        &self,
        products: Vec<ProductInsert>,
    ) -> Result<Vec<ProductRecord>, AtomicInsertError> {
        let mut tx = TransactionGuard::begin(&self.pool)
            .await
            .map_err(|e| AtomicInsertError::whole_batch(e.into()))?;

        let mut rows = Vec::with_capacity(products.len());
        for (index, product) in products.iter().enumerate() {
            match insert_one(&mut **tx, product).await {
                Ok(row) => rows.push(row),
                Err(e) => {
                    let source = StoreError::from(e);
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!(error = %rollback_err, "Rollback after failed batch insert failed");
                    }
                    return Err(AtomicInsertError::at(index, source));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| AtomicInsertError::whole_batch(e.into()))?;

        rows.into_iter()
            .map(ProductRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AtomicInsertError::whole_batch)
    }

    #[tracing::instrument(skip(self), fields(db.table = "products", db.operation = "select", db.record_id = %id))]
    async fn get_product(
        &self,
        seller_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ProductRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM products WHERE seller_id = $1 AND id = $2",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query_as::<Postgres, ProductRow>(&sql)
            .bind(seller_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProductRecord::try_from).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "products", db.operation = "select"))]
    async fn list_products(
        &self,
        seller_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM products WHERE seller_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, ProductRow>(&sql)
            .bind(seller_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ProductRecord::try_from).collect()
    }
}
