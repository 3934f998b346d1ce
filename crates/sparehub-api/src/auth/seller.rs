use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sparehub_core::AppError;
use uuid::Uuid;

/// Header carrying the authenticated seller's id
pub const SELLER_ID_HEADER: &str = "x-seller-id";

/// Seller on whose behalf the request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellerContext {
    pub seller_id: Uuid,
}

// Extracted from request parts so it can precede a Multipart body extractor
impl<S> FromRequestParts<S> for SellerContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SELLER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(|seller_id| SellerContext { seller_id })
            .ok_or_else(|| {
                HttpAppError(AppError::BadRequest(
                    "Seller identity is required".to_string(),
                ))
            })
    }
}
