//! Template download integration tests.
//!
//! Run with: `cargo test -p sparehub-api --test template_test`

mod helpers;

use calamine::{open_workbook_auto_from_rs, Reader};
use helpers::{api_path, setup_test_app, HEADER};
use std::io::Cursor;

#[tokio::test]
async fn test_csv_template_download() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get(&api_path("/products/bulk-upload/template"))
        .add_query_param("format", "csv")
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"product_template.csv\""
    );
    assert_eq!(response.header("content-type"), "text/csv; charset=utf-8");

    let body = String::from_utf8(response.as_bytes().to_vec()).unwrap();
    assert_eq!(body.lines().next(), Some(HEADER));
    assert_eq!(body.lines().count(), 2);
}

#[tokio::test]
async fn test_xlsx_template_is_default_and_readable() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get(&api_path("/products/bulk-upload/template"))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"product_template.xlsx\""
    );

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(response.as_bytes().to_vec()))
        .expect("template should be a valid workbook");
    let range = workbook.worksheet_range("Products").unwrap();
    let header: Vec<String> = range
        .rows()
        .next()
        .unwrap()
        .iter()
        .map(|cell| cell.to_string())
        .collect();
    assert_eq!(header.join(","), HEADER);
    assert_eq!(range.height(), 2);
}

#[tokio::test]
async fn test_template_download_is_idempotent() {
    let app = setup_test_app().await;
    let first = app
        .client()
        .get(&api_path("/products/bulk-upload/template"))
        .add_query_param("format", "xlsx")
        .await;
    let second = app
        .client()
        .get(&api_path("/products/bulk-upload/template"))
        .add_query_param("format", "xlsx")
        .await;

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[tokio::test]
async fn test_unknown_template_format() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get(&api_path("/products/bulk-upload/template"))
        .add_query_param("format", "ods")
        .await;

    assert_eq!(response.status_code(), 400);
}
