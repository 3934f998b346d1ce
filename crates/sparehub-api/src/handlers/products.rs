use crate::auth::SellerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sparehub_core::models::ProductRecord;
use sparehub_core::AppError;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "products",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("X-Seller-Id" = Uuid, Header, description = "Authenticated seller")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductRecord),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    seller: SellerContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let product = state
        .store
        .get_product(seller.seller_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "products",
    params(
        PaginationQuery,
        ("X-Seller-Id" = Uuid, Header, description = "Authenticated seller")
    ),
    responses(
        (status = 200, description = "Seller's products, newest first", body = Vec<ProductRecord>),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    seller: SellerContext,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    pagination.validate().map_err(AppError::from)?;

    let products = state
        .store
        .list_products(seller.seller_id, pagination.limit, pagination.offset)
        .await?;

    Ok(Json(products))
}
