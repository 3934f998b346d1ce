//! Test helpers: pipeline over an in-memory store plus CSV fixtures.
//!
//! Run with: `cargo test -p sparehub-processing --test pipeline_test`

#![allow(dead_code)]

use sparehub_core::IngestionConfig;
use sparehub_db::test_helpers::InMemoryProductStore;
use sparehub_processing::{IngestionPipeline, UploadedFile};
use std::sync::Arc;
use uuid::Uuid;

pub const HEADER: &str =
    "name,description,price,category,stock,images,specifications,brand,model,condition";

pub const SPECS: &str = r#"{"article":"1R-0750","manufacturer":"Caterpillar","compatibility":["C7","C9"]}"#;

pub struct TestPipeline {
    pub pipeline: IngestionPipeline,
    pub store: InMemoryProductStore,
    pub seller_id: Uuid,
}

pub fn setup_pipeline() -> TestPipeline {
    setup_pipeline_with(IngestionConfig::default())
}

pub fn setup_pipeline_with(config: IngestionConfig) -> TestPipeline {
    let store = InMemoryProductStore::new();
    let seller_id = Uuid::new_v4();
    store.add_seller(seller_id);
    let pipeline = IngestionPipeline::new(Arc::new(store.clone()), &config);
    TestPipeline {
        pipeline,
        store,
        seller_id,
    }
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// A CSV line for a valid product named `name`
pub fn valid_line(name: &str) -> String {
    line(name, "3500", "12")
}

pub fn line(name: &str, price: &str, stock: &str) -> String {
    [
        name,
        "Replacement part for Caterpillar engines",
        price,
        "Filters",
        stock,
        "filter.jpg",
        quote(SPECS).as_str(),
        "Caterpillar",
        "C7",
        "new",
    ]
    .join(",")
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

pub fn upload(filename: &str, bytes: &[u8]) -> UploadedFile {
    UploadedFile::from_bytes_in(None, filename, bytes).unwrap()
}
