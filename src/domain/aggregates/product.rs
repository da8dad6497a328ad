//! Product Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use crate::domain::aggregates::campaign::{key_string, Campaign, Discount};
use crate::domain::value_objects::Price;

/// Keys the priced output writes itself. They never pass through `attributes`.
pub const RESERVED_KEYS: &[&str] = &[
    "id", "_id", "price", "originalPrice", "campaign", "gender", "category", "childCategory", "child_category",
];

pub fn is_reserved(key: &str) -> bool { RESERVED_KEYS.contains(&key) }

/// Drops every reserved key from a bag of extra attributes.
pub fn strip_reserved(attributes: &mut Map<String, Value>) {
    attributes.retain(|k, _| !is_reserved(k));
}

/// Catalog product as handed over by the backend.
///
/// Only `id`, `price` and the three classification keys take part in pricing;
/// every other attribute rides along in `attributes` and is echoed back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ProductRecord")]
pub struct Product {
    pub id: String,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_category: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Wire shape of a product. Ids may be strings or numbers.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    id: String,
    price: Price,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    child_category: Option<String>,
    #[serde(flatten)]
    attributes: Map<String, Value>,
}

impl From<ProductRecord> for Product {
    fn from(r: ProductRecord) -> Self {
        let mut attributes = r.attributes;
        strip_reserved(&mut attributes);
        Self { id: r.id, price: r.price, gender: r.gender, category: r.category, child_category: r.child_category, attributes }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    key_string(&value).ok_or_else(|| serde::de::Error::custom(format!("id must be a string or a number, got {}", value)))
}

impl Product {
    pub fn new(id: impl Into<String>, price: Price) -> Self {
        Self { id: id.into(), price, gender: None, category: None, child_category: None, attributes: Map::new() }
    }
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self { self.gender = Some(gender.into()); self }
    pub fn with_category(mut self, category: impl Into<String>) -> Self { self.category = Some(category.into()); self }
    pub fn with_child_category(mut self, child: impl Into<String>) -> Self { self.child_category = Some(child.into()); self }
    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if !is_reserved(&key) { self.attributes.insert(key, value); }
        self
    }
}

/// The campaign that set a product's effective price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCampaign {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub discount: Discount,
    pub amount: Decimal,
}

impl AppliedCampaign {
    pub fn from_campaign(campaign: &Campaign, amount: Decimal) -> Self {
        Self { id: campaign.id.clone(), name: campaign.name.clone(), discount: campaign.discount, amount }
    }
}

/// Product with its resolved price. `price` is the effective price;
/// `original_price` is set only when a discount actually applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    pub id: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub campaign: Option<AppliedCampaign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_category: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl PricedProduct {
    pub fn full_price(product: &Product) -> Self { Self::build(product, product.price, None, None) }

    pub fn discounted(product: &Product, effective: Price, applied: AppliedCampaign) -> Self {
        Self::build(product, effective, Some(product.price), Some(applied))
    }

    fn build(product: &Product, price: Price, original_price: Option<Price>, campaign: Option<AppliedCampaign>) -> Self {
        Self {
            id: product.id.clone(), price, original_price, campaign,
            gender: product.gender.clone(), category: product.category.clone(),
            child_category: product.child_category.clone(),
            attributes: product.attributes.iter().filter(|(k, _)| !is_reserved(k)).map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    pub fn is_on_sale(&self) -> bool { self.original_price.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_from_backend_json() {
        let p: Product = serde_json::from_value(json!({
            "_id": "p1", "price": 2500, "gender": "Women", "category": "Lawn Collection",
            "childCategory": "3 Piece", "name": "Printed Lawn Suit", "images": ["a.jpg"]
        })).unwrap();
        assert_eq!(p.id, "p1");
        assert_eq!(p.price.amount(), Decimal::new(2500, 0));
        assert_eq!(p.child_category.as_deref(), Some("3 Piece"));
        assert_eq!(p.attributes.get("name"), Some(&json!("Printed Lawn Suit")));
        assert!(!p.attributes.contains_key("price"));
    }

    #[test]
    fn test_full_price_serializes_null_original() {
        let p = Product::new("p1", Price::new(Decimal::new(100, 0)).unwrap()).with_attribute("name", json!("Shawl"));
        let v = serde_json::to_value(PricedProduct::full_price(&p)).unwrap();
        assert_eq!(v["originalPrice"], Value::Null);
        assert_eq!(v["campaign"], Value::Null);
        assert_eq!(v["name"], json!("Shawl"));
        assert_eq!(v["price"], json!(100.0));
    }

    #[test]
    fn test_reserved_keys_do_not_ride_along() {
        let p: Product = serde_json::from_value(json!({
            "_id": "p1", "price": 1000, "originalPrice": 1500, "campaign": {"id": "old"},
            "child_category": "stale", "name": "Shawl"
        })).unwrap();
        assert_eq!(p.attributes.keys().collect::<Vec<_>>(), ["name"]);
        let text = serde_json::to_string(&PricedProduct::full_price(&p)).unwrap();
        assert_eq!(text.matches("\"originalPrice\"").count(), 1);
        assert_eq!(text.matches("\"campaign\"").count(), 1);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["originalPrice"], Value::Null);
        assert_eq!(back["campaign"], Value::Null);
    }

    #[test]
    fn test_reserved_attribute_is_ignored_by_builder() {
        let p = Product::new("p1", Price::zero()).with_attribute("price", json!(5)).with_attribute("sku", json!("A1"));
        assert!(!p.attributes.contains_key("price"));
        assert_eq!(p.attributes.get("sku"), Some(&json!("A1")));
    }

    #[test]
    fn test_numeric_id_accepted() {
        let p: Product = serde_json::from_value(json!({"id": 42, "price": 10})).unwrap();
        assert_eq!(p.id, "42");
        assert!(serde_json::from_value::<Product>(json!({"id": [1], "price": 10})).is_err());
        assert!(serde_json::from_value::<Product>(json!({"id": "p1", "price": -1})).is_err());
    }
}
