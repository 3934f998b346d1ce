use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Physical condition of a listed part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    New,
    Used,
    Refurbished,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
            Condition::Refurbished => "refurbished",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown condition '{0}'")]
pub struct UnknownCondition(pub String);

impl FromStr for Condition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(Condition::New),
            "used" => Ok(Condition::Used),
            "refurbished" => Ok(Condition::Refurbished),
            other => Err(UnknownCondition(other.to_string())),
        }
    }
}

/// Technical attributes carried by every spare part.
///
/// Unknown keys supplied by the seller are kept in `extra` and stored alongside
/// the known ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specifications {
    /// Catalog (part) number
    pub article: String,
    pub manufacturer: String,
    /// Equipment models this part fits; never empty
    pub compatibility: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A product row that passed validation but has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub brand: String,
    pub model: String,
    pub condition: Condition,
    pub specifications: Specifications,
    pub images: Vec<String>,
    /// Seller-supplied SKU; derived at persistence time when absent
    pub sku: Option<String>,
}

/// Everything the store needs to insert one product
#[derive(Debug, Clone)]
pub struct ProductInsert {
    pub seller_id: Uuid,
    pub slug: String,
    pub sku: String,
    pub product: NewProduct,
}

/// Persisted product
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductRecord {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub stock: i32,
    pub brand: String,
    pub model: String,
    pub condition: Condition,
    #[schema(value_type = Object)]
    pub specifications: Specifications,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Materialize a record from an insert payload and store-assigned fields
    pub fn from_insert(insert: ProductInsert, id: Uuid, now: DateTime<Utc>) -> Self {
        let ProductInsert {
            seller_id,
            slug,
            sku,
            product,
        } = insert;
        Self {
            id,
            seller_id,
            name: product.name,
            slug,
            sku,
            description: product.description,
            price: product.price,
            category: product.category,
            stock: product.stock,
            brand: product.brand,
            model: product.model,
            condition: product.condition,
            specifications: product.specifications,
            images: product.images,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_parse_is_case_insensitive() {
        assert_eq!("Used".parse::<Condition>(), Ok(Condition::Used));
        assert_eq!(" REFURBISHED ".parse::<Condition>(), Ok(Condition::Refurbished));
        assert!("broken".parse::<Condition>().is_err());
    }

    #[test]
    fn test_specifications_keep_extra_keys() {
        let value = json!({
            "article": "4110000991",
            "manufacturer": "JCB",
            "compatibility": ["3CX", "4CX"],
            "weight": 12.5,
            "thread": "M16"
        });
        let specs: Specifications = serde_json::from_value(value).unwrap();
        assert_eq!(specs.article, "4110000991");
        assert_eq!(specs.weight, Some(12.5));
        assert_eq!(specs.extra.get("thread"), Some(&json!("M16")));

        let back = serde_json::to_value(&specs).unwrap();
        assert_eq!(back["thread"], json!("M16"));
        assert!(back.get("dimensions").is_none());
    }
}
