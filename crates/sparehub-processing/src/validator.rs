//! Row validator: one [`RawRow`] in, a [`NewProduct`] or the first failed rule out.
//!
//! Rules run in a fixed order and stop at the first failure:
//! presence, text lengths, price/stock, images, specifications, condition, sku.
//! Lengths are counted in characters after trimming.

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sparehub_core::models::{Condition, NewProduct, Specifications};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::tabular::RawRow;

/// Columns every row must fill, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 8] = [
    "name",
    "description",
    "price",
    "category",
    "stock",
    "specifications",
    "brand",
    "model",
];

const MAX_SKU_LEN: usize = 64;

/// Upper bound of NUMERIC(14, 2)
const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

static SKU_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid SKU pattern"));

/// A rule a row failed. `Display` is the plain-language reason shown to the seller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field {0} is required")]
    MissingField(&'static str),

    #[error("Field {field} must be between {min} and {max} characters")]
    LengthOutOfRange {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("Field {field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Price must be a positive number")]
    InvalidPrice,

    #[error("Price must be less than 1000000000000")]
    PriceTooLarge,

    #[error("Price must have at most 2 decimal places")]
    TooManyPriceDecimals,

    #[error("Stock must be a non-negative integer")]
    InvalidStock,

    #[error("Images must be a comma-separated list or a JSON array of strings")]
    InvalidImages,

    #[error("Invalid specifications format")]
    InvalidSpecificationsFormat,

    #[error("Specifications must be an object")]
    SpecificationsNotObject,

    #[error("Specifications field {0} is required")]
    MissingSpecification(&'static str),

    #[error("Specifications field {0} must be text")]
    InvalidSpecificationValue(&'static str),

    #[error("Compatibility must be a non-empty list of equipment models")]
    InvalidCompatibility,

    #[error("Weight must be a non-negative number")]
    InvalidWeight,

    #[error("Condition must be one of: new, used, refurbished (got '{0}')")]
    InvalidCondition(String),

    #[error("SKU must be at most 64 characters of letters, digits, '.', '_' or '-'")]
    InvalidSku,
}

/// Validate one row. Never panics; every failure is a [`ValidationError`].
pub fn validate_row(row: &RawRow) -> Result<NewProduct, ValidationError> {
    // 1. presence
    let name = required(row, "name")?;
    let description = required(row, "description")?;
    let price = required(row, "price")?;
    let category = required(row, "category")?;
    let stock = required(row, "stock")?;
    let specifications = required(row, "specifications")?;
    let brand = required(row, "brand")?;
    let model = required(row, "model")?;

    // 2. lengths
    check_length("name", &name, 3, 200)?;
    check_length("description", &description, 10, 2000)?;
    check_length("category", &category, 2, 50)?;
    check_max_length("brand", &brand, 100)?;
    check_max_length("model", &model, 100)?;

    // 3. numbers
    let price = parse_price(&price)?;
    let stock = parse_stock(&stock)?;

    // 4. images
    let images = parse_images(row.text("images").as_deref())?;

    // 5. specifications
    let specifications = parse_specifications(&specifications)?;

    // 6. condition
    let condition = match row.text("condition") {
        None => Condition::default(),
        Some(raw) => raw
            .parse::<Condition>()
            .map_err(|_| ValidationError::InvalidCondition(raw))?,
    };

    let sku = row.text("sku").map(|s| check_sku(&s).map(|_| s)).transpose()?;

    Ok(NewProduct {
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
        sku,
    })
}

fn required(row: &RawRow, field: &'static str) -> Result<String, ValidationError> {
    row.text(field).ok_or(ValidationError::MissingField(field))
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::LengthOutOfRange { field, min, max });
    }
    Ok(())
}

fn check_max_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

/// Accepts "1250", "1250.50", "1250,50" and scientific notation with at most two decimals.
fn parse_price(raw: &str) -> Result<Decimal, ValidationError> {
    let normalized = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };
    let value = match Decimal::from_str(&normalized).or_else(|_| Decimal::from_scientific(&normalized)) {
        Ok(value) => value,
        // Numbers beyond Decimal's range or precision still get the matching reason
        Err(_) => {
            return Err(match normalized.parse::<f64>() {
                Ok(f) if f.is_finite() && f >= 1e12 => ValidationError::PriceTooLarge,
                Ok(f) if f.is_finite() && f > 0.0 => ValidationError::TooManyPriceDecimals,
                _ => ValidationError::InvalidPrice,
            });
        }
    };

    if value <= Decimal::ZERO {
        return Err(ValidationError::InvalidPrice);
    }
    if value >= MAX_PRICE {
        return Err(ValidationError::PriceTooLarge);
    }
    if value.normalize().scale() > 2 {
        return Err(ValidationError::TooManyPriceDecimals);
    }
    Ok(value)
}

fn parse_stock(raw: &str) -> Result<i32, ValidationError> {
    let value = match raw.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let f = raw
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidStock)?;
            if !f.is_finite() || f.fract() != 0.0 {
                return Err(ValidationError::InvalidStock);
            }
            f as i64
        }
    };
    i32::try_from(value)
        .ok()
        .filter(|v| *v >= 0)
        .ok_or(ValidationError::InvalidStock)
}

fn parse_images(raw: Option<&str>) -> Result<Vec<String>, ValidationError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let items: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str::<Vec<String>>(raw).map_err(|_| ValidationError::InvalidImages)?
    } else {
        raw.split(',').map(str::to_string).collect()
    };

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn parse_specifications(raw: &str) -> Result<Specifications, ValidationError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|_| ValidationError::InvalidSpecificationsFormat)?;
    let Value::Object(mut map) = value else {
        return Err(ValidationError::SpecificationsNotObject);
    };

    let article = take_text(&mut map, "article")?
        .ok_or(ValidationError::MissingSpecification("article"))?;
    let manufacturer = take_text(&mut map, "manufacturer")?
        .ok_or(ValidationError::MissingSpecification("manufacturer"))?;
    let compatibility = take_compatibility(&mut map)?;
    let weight = take_weight(&mut map)?;
    let dimensions = take_text(&mut map, "dimensions")?;
    let material = take_text(&mut map, "material")?;

    Ok(Specifications {
        article,
        manufacturer,
        compatibility,
        dimensions,
        weight,
        material,
        extra: map,
    })
}

/// Removes `key`; strings are trimmed, numbers stringified, blank or null is `None`.
fn take_text(
    map: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, ValidationError> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ValidationError::InvalidSpecificationValue(key)),
    }
}

fn take_compatibility(map: &mut Map<String, Value>) -> Result<Vec<String>, ValidationError> {
    let items = match map.remove("compatibility") {
        None | Some(Value::Null) => {
            return Err(ValidationError::MissingSpecification("compatibility"))
        }
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::InvalidCompatibility),
    };

    let mut models = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(s) if !s.trim().is_empty() => models.push(s.trim().to_string()),
            _ => return Err(ValidationError::InvalidCompatibility),
        }
    }
    if models.is_empty() {
        return Err(ValidationError::InvalidCompatibility);
    }
    Ok(models)
}

fn take_weight(map: &mut Map<String, Value>) -> Result<Option<f64>, ValidationError> {
    let weight = match map.remove("weight") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match weight {
        Some(w) if w.is_finite() && w >= 0.0 => Ok(Some(w)),
        _ => Err(ValidationError::InvalidWeight),
    }
}

fn check_sku(sku: &str) -> Result<(), ValidationError> {
    if sku.len() > MAX_SKU_LEN || !SKU_PATTERN.is_match(sku) {
        return Err(ValidationError::InvalidSku);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::CellValue;

    const SPECS: &str = r#"{"article":"1R-0750","manufacturer":"Caterpillar","compatibility":["C7","C9"],"weight":0.8}"#;

    fn valid_row() -> RawRow {
        let mut row = RawRow::new(1);
        row.insert("name", CellValue::text("Oil filter CAT C7"));
        row.insert(
            "description",
            CellValue::text("Engine oil filter for Caterpillar C7 engines"),
        );
        row.insert("price", CellValue::Number(3500.0));
        row.insert("category", CellValue::text("Filters"));
        row.insert("stock", CellValue::Number(12.0));
        row.insert("images", CellValue::text("filter-1.jpg, filter-2.jpg"));
        row.insert("specifications", CellValue::text(SPECS));
        row.insert("brand", CellValue::text("Caterpillar"));
        row.insert("model", CellValue::text("C7"));
        row
    }

    fn with(mut row: RawRow, column: &str, value: CellValue) -> RawRow {
        row.insert(column, value);
        row
    }

    #[test]
    fn test_valid_row_echoes_fields() {
        let product = validate_row(&valid_row()).unwrap();
        assert_eq!(product.name, "Oil filter CAT C7");
        assert_eq!(product.price, Decimal::new(3500, 0));
        assert_eq!(product.stock, 12);
        assert_eq!(product.images, vec!["filter-1.jpg", "filter-2.jpg"]);
        assert_eq!(product.condition, Condition::New);
        assert_eq!(product.specifications.article, "1R-0750");
        assert_eq!(product.specifications.compatibility, vec!["C7", "C9"]);
        assert_eq!(product.specifications.weight, Some(0.8));
        assert_eq!(product.sku, None);
    }

    #[test]
    fn test_each_missing_required_field_is_named() {
        for field in REQUIRED_FIELDS {
            let row = with(valid_row(), field, CellValue::Empty);
            assert_eq!(
                validate_row(&row).unwrap_err(),
                ValidationError::MissingField(field),
                "field {field}"
            );
        }
    }

    #[test]
    fn test_whitespace_only_counts_as_missing() {
        let row = with(valid_row(), "brand", CellValue::Text("   ".to_string()));
        assert_eq!(
            validate_row(&row).unwrap_err().to_string(),
            "Field brand is required"
        );
    }

    #[test]
    fn test_first_missing_field_wins() {
        let mut row = with(valid_row(), "price", CellValue::Empty);
        row.insert("model", CellValue::Empty);
        assert_eq!(
            validate_row(&row).unwrap_err(),
            ValidationError::MissingField("price")
        );
    }

    #[test]
    fn test_length_rules_count_characters() {
        let row = with(valid_row(), "name", CellValue::text("Фи"));
        assert!(matches!(
            validate_row(&row),
            Err(ValidationError::LengthOutOfRange { field: "name", .. })
        ));

        // Three Cyrillic characters are six bytes but a valid name
        let row = with(valid_row(), "name", CellValue::text("Фит"));
        assert!(validate_row(&row).is_ok());

        let row = with(valid_row(), "description", CellValue::text("too short"));
        assert!(matches!(
            validate_row(&row),
            Err(ValidationError::LengthOutOfRange {
                field: "description",
                ..
            })
        ));

        let row = with(valid_row(), "model", CellValue::text(&"x".repeat(101)));
        assert_eq!(
            validate_row(&row).unwrap_err(),
            ValidationError::TooLong {
                field: "model",
                max: 100
            }
        );
    }

    #[test]
    fn test_numeric_name_is_coerced() {
        let row = with(valid_row(), "model", CellValue::Number(320.0));
        assert_eq!(validate_row(&row).unwrap().model, "320");
    }

    #[test]
    fn test_price_rules() {
        for bad in ["-5", "0", "-0.001", "abc", "NaN"] {
            let row = with(valid_row(), "price", CellValue::text(bad));
            assert_eq!(
                validate_row(&row).unwrap_err(),
                ValidationError::InvalidPrice,
                "price {bad}"
            );
        }
        for fractional in ["0.001", "0.005", "100.005", "1e-30"] {
            let row = with(valid_row(), "price", CellValue::text(fractional));
            assert_eq!(
                validate_row(&row).unwrap_err(),
                ValidationError::TooManyPriceDecimals,
                "price {fractional}"
            );
        }
        for huge in ["1e13", "12345678901234567890123456789012"] {
            let row = with(valid_row(), "price", CellValue::text(huge));
            assert_eq!(
                validate_row(&row).unwrap_err(),
                ValidationError::PriceTooLarge,
                "price {huge}"
            );
        }

        let row = with(valid_row(), "price", CellValue::text("1250,50"));
        assert_eq!(validate_row(&row).unwrap().price, Decimal::new(125050, 2));
        let row = with(valid_row(), "price", CellValue::text("0.01"));
        assert_eq!(validate_row(&row).unwrap().price, Decimal::new(1, 2));
        let row = with(valid_row(), "price", CellValue::text("99.500"));
        assert_eq!(validate_row(&row).unwrap().price, Decimal::new(995, 1));
    }

    #[test]
    fn test_stock_rules() {
        for bad in ["-1", "2.5", "many"] {
            let row = with(valid_row(), "stock", CellValue::text(bad));
            assert_eq!(
                validate_row(&row).unwrap_err(),
                ValidationError::InvalidStock,
                "stock {bad}"
            );
        }
        let row = with(valid_row(), "stock", CellValue::Number(0.0));
        assert_eq!(validate_row(&row).unwrap().stock, 0);
    }

    #[test]
    fn test_images_json_array_and_invalid() {
        let row = with(
            valid_row(),
            "images",
            CellValue::text(r#"["a.jpg", "https://cdn.example.com/b.png"]"#),
        );
        assert_eq!(
            validate_row(&row).unwrap().images,
            vec!["a.jpg", "https://cdn.example.com/b.png"]
        );

        let row = with(valid_row(), "images", CellValue::text("[1, 2]"));
        assert_eq!(
            validate_row(&row).unwrap_err(),
            ValidationError::InvalidImages
        );

        let row = with(valid_row(), "images", CellValue::Empty);
        assert!(validate_row(&row).unwrap().images.is_empty());
    }

    #[test]
    fn test_specifications_rules() {
        let cases = [
            ("not json", ValidationError::InvalidSpecificationsFormat),
            ("[1,2]", ValidationError::SpecificationsNotObject),
            (
                r#"{"manufacturer":"CAT","compatibility":["C7"]}"#,
                ValidationError::MissingSpecification("article"),
            ),
            (
                r#"{"article":"  ","manufacturer":"CAT","compatibility":["C7"]}"#,
                ValidationError::MissingSpecification("article"),
            ),
            (
                r#"{"article":"A1","compatibility":["C7"]}"#,
                ValidationError::MissingSpecification("manufacturer"),
            ),
            (
                r#"{"article":"A1","manufacturer":"CAT"}"#,
                ValidationError::MissingSpecification("compatibility"),
            ),
            (
                r#"{"article":"A1","manufacturer":"CAT","compatibility":[]}"#,
                ValidationError::InvalidCompatibility,
            ),
            (
                r#"{"article":"A1","manufacturer":"CAT","compatibility":"C7"}"#,
                ValidationError::InvalidCompatibility,
            ),
            (
                r#"{"article":"A1","manufacturer":"CAT","compatibility":["C7"],"weight":-2}"#,
                ValidationError::InvalidWeight,
            ),
        ];
        for (raw, expected) in cases {
            let row = with(valid_row(), "specifications", CellValue::text(raw));
            assert_eq!(validate_row(&row).unwrap_err(), expected, "specs {raw}");
        }
    }

    #[test]
    fn test_specifications_keep_optional_and_extra_fields() {
        let raw = r#"{"article":4110000991,"manufacturer":"JCB","compatibility":["3CX"],"weight":"38.5","dimensions":"120x80x60","seal_kit":"included"}"#;
        let row = with(valid_row(), "specifications", CellValue::text(raw));
        let specs = validate_row(&row).unwrap().specifications;
        assert_eq!(specs.article, "4110000991");
        assert_eq!(specs.weight, Some(38.5));
        assert_eq!(specs.dimensions.as_deref(), Some("120x80x60"));
        assert_eq!(specs.extra.get("seal_kit"), Some(&Value::from("included")));
    }

    #[test]
    fn test_condition_rules() {
        let row = with(valid_row(), "condition", CellValue::text("Refurbished"));
        assert_eq!(validate_row(&row).unwrap().condition, Condition::Refurbished);

        let row = with(valid_row(), "condition", CellValue::text("scrap"));
        assert_eq!(
            validate_row(&row).unwrap_err(),
            ValidationError::InvalidCondition("scrap".to_string())
        );
    }

    #[test]
    fn test_supplied_sku() {
        let row = with(valid_row(), "sku", CellValue::text("CAT-1R0750"));
        assert_eq!(validate_row(&row).unwrap().sku.as_deref(), Some("CAT-1R0750"));

        let row = with(valid_row(), "sku", CellValue::text("bad sku!"));
        assert_eq!(validate_row(&row).unwrap_err(), ValidationError::InvalidSku);
    }

    #[test]
    fn test_rule_order_lengths_before_numbers() {
        let mut row = with(valid_row(), "name", CellValue::text("ab"));
        row.insert("price", CellValue::text("-1"));
        assert!(matches!(
            validate_row(&row),
            Err(ValidationError::LengthOutOfRange { field: "name", .. })
        ));
    }
}
