//! Test helpers: build AppState and router over an in-memory product store.
//!
//! Run from workspace root: `cargo test -p sparehub-api`. No database is needed.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use sparehub_api::constants;
use sparehub_api::setup::routes;
use sparehub_api::state::AppState;
use sparehub_core::{AppConfig, Config, IngestionConfig, ServerConfig};
use sparehub_db::test_helpers::InMemoryProductStore;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub const SELLER_HEADER: &str = "X-Seller-Id";

pub const HEADER: &str =
    "name,description,price,category,stock,images,specifications,brand,model,condition";

const SPECS: &str =
    r#""{""article"":""6I-2501"",""manufacturer"":""Caterpillar"",""compatibility"":[""320D"",""325D""]}""#;

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, store and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub store: InMemoryProductStore,
    pub seller_id: Uuid,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn seller(&self) -> String {
        self.seller_id.to_string()
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(IngestionConfig::default()).await
}

pub async fn setup_test_app_with(ingestion: IngestionConfig) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::new(AppConfig {
        server: ServerConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            environment: "test".to_string(),
            log_format: "text".to_string(),
        },
        ingestion: IngestionConfig {
            template_dir: temp_dir.path().join("templates"),
            ..ingestion
        },
        database_url: "postgres://unused".to_string(),
    });

    let store = InMemoryProductStore::new();
    let seller_id = Uuid::new_v4();
    store.add_seller(seller_id);

    let state = Arc::new(AppState::new(config.clone(), Arc::new(store.clone())));
    let app = routes::setup_routes(&config, state)
        .await
        .expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        seller_id,
        _temp_dir: temp_dir,
    }
}

/// A CSV line for a product named `name`
pub fn line(name: &str, price: &str, stock: &str) -> String {
    [
        name,
        "Hydraulic pump seal kit",
        price,
        "Hydraulics",
        stock,
        "seal.jpg",
        SPECS,
        "Caterpillar",
        "320D",
        "used",
    ]
    .join(",")
}

pub fn valid_line(name: &str) -> String {
    line(name, "4200", "3")
}

pub fn csv(lines: &[String]) -> Vec<u8> {
    let mut out = String::from(HEADER);
    for l in lines {
        out.push('\n');
        out.push_str(l);
    }
    out.push('\n');
    out.into_bytes()
}

pub fn file_form(filename: &str, bytes: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes).file_name(filename.to_string()).mime_type("text/csv");
    MultipartForm::new().add_part("file", part)
}
