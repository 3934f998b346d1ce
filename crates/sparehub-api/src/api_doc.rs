//! OpenAPI documentation, served at `/api-docs/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use sparehub_core::models;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SpareHub API",
        version = "0.1.0",
        description = "Bulk product ingestion for the SpareHub spare-parts marketplace. Sellers upload an .xlsx, .xls or .csv file; every row is validated and stored either independently or all-or-nothing."
    ),
    paths(
        // Bulk upload
        handlers::bulk_upload::bulk_upload,
        handlers::bulk_upload::preview_upload,
        handlers::template::download_template,
        // Products
        handlers::products::list_products,
        handlers::products::get_product,
    ),
    components(
        schemas(
            models::ProductRecord,
            models::Condition,
            models::PersistMode,
            models::IngestionProgress,
            handlers::bulk_upload::IsolatedUploadResponse,
            handlers::bulk_upload::TransactionalUploadResponse,
            handlers::bulk_upload::PreviewResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "bulk-upload", description = "Spreadsheet product import"),
        (name = "products", description = "Seller product catalogue")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_bulk_upload_paths() {
        let spec = get_openapi_spec();
        assert!(spec.paths.paths.contains_key("/api/v1/products/bulk-upload"));
        assert!(spec
            .paths
            .paths
            .contains_key("/api/v1/products/bulk-upload/template"));
        assert!(spec.paths.paths.contains_key("/api/v1/products/{id}"));
    }
}
