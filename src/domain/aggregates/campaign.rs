//! Campaign Aggregate
//!
//! A campaign is a time-boxed discount limited to a scope of the catalog.
//! Records arrive loosely typed (admin-authored JSON, JSONB columns), so
//! they are read into [`CampaignRecord`] first and converted one by one;
//! a record that does not convert is skipped rather than failing the batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::Price;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Discount {
    /// Percent of the base price, e.g. `20` for 20 %.
    Percentage(Decimal),
    /// Flat amount off the base price.
    Fixed(Decimal),
}

impl Discount {
    pub fn amount_for(&self, base: Price) -> Decimal {
        match self {
            Discount::Percentage(percent) => base.percentage(*percent),
            Discount::Fixed(amount) => *amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "target", rename_all = "kebab-case")]
pub enum Scope {
    All,
    Product(Vec<String>),
    ParentCategory(Vec<String>),
    Category(Vec<String>),
    ChildCategory(Vec<String>),
}

impl Scope {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Scope::All => true,
            Scope::Product(ids) => contains(ids, Some(&product.id)),
            Scope::ParentCategory(names) => contains(names, product.gender.as_ref()),
            Scope::Category(names) => contains(names, product.category.as_ref()),
            Scope::ChildCategory(names) => contains(names, product.child_category.as_ref()),
        }
    }
}

fn contains(targets: &[String], key: Option<&String>) -> bool {
    key.map(|k| targets.iter().any(|t| t == k)).unwrap_or(false)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub discount: Discount,
    pub scope: Scope,
}

impl Campaign {
    /// Active flag set and `now` inside the inclusive window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.start_date <= now && now <= self.end_date
    }
    pub fn applies_to(&self, product: &Product) -> bool { self.scope.matches(product) }
    pub fn discount_amount(&self, base: Price) -> Decimal { self.discount.amount_for(base) }
}

// =============================================================================
// Loose records
// =============================================================================

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub discount: Option<DiscountRecord>,
    #[serde(default)]
    pub scope: Option<ScopeRecord>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DiscountRecord {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScopeRecord {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub target: Option<Value>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CampaignError {
    #[error("campaign has no id")]
    MissingId,
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unknown discount type: {0}")]
    UnknownDiscountType(String),
    #[error("unknown scope type: {0}")]
    UnknownScopeType(String),
    #[error("discount value is not a number: {0}")]
    NonNumericValue(String),
    #[error("unparseable {field}: {value}")]
    BadTimestamp { field: &'static str, value: String },
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl TryFrom<CampaignRecord> for Campaign {
    type Error = CampaignError;

    fn try_from(r: CampaignRecord) -> Result<Self, Self::Error> {
        let id = r.id.as_ref().and_then(key_string).ok_or(CampaignError::MissingId)?;
        let discount = Discount::try_from(r.discount.ok_or(CampaignError::MissingField("discount"))?)?;
        let scope = Scope::try_from(r.scope.ok_or(CampaignError::MissingField("scope"))?)?;
        let start_date = timestamp_field("startDate", r.start_date.as_deref())?;
        let end_date = timestamp_field("endDate", r.end_date.as_deref())?;
        Ok(Campaign { id, name: r.name, is_active: r.is_active.unwrap_or(false), start_date, end_date, discount, scope })
    }
}

impl TryFrom<DiscountRecord> for Discount {
    type Error = CampaignError;

    fn try_from(r: DiscountRecord) -> Result<Self, Self::Error> {
        let kind = r.kind.ok_or(CampaignError::MissingField("discount.type"))?;
        let value = r.value.ok_or(CampaignError::MissingField("discount.value"))?;
        let value = numeric(&value).ok_or_else(|| CampaignError::NonNumericValue(value.to_string()))?;
        // Negative values would raise the price; they count as no discount.
        let value = value.max(Decimal::ZERO);
        match kind.as_str() {
            "percentage" => Ok(Discount::Percentage(value)),
            "fixed" => Ok(Discount::Fixed(value)),
            _ => Err(CampaignError::UnknownDiscountType(kind)),
        }
    }
}

impl TryFrom<ScopeRecord> for Scope {
    type Error = CampaignError;

    fn try_from(r: ScopeRecord) -> Result<Self, Self::Error> {
        let kind = r.kind.ok_or(CampaignError::MissingField("scope.type"))?;
        let targets: Vec<String> = match r.target {
            Some(Value::Array(items)) => items.iter().filter_map(key_string).collect(),
            Some(single) => key_string(&single).into_iter().collect(),
            None => Vec::new(),
        };
        match kind.as_str() {
            "all" => Ok(Scope::All),
            "product" => Ok(Scope::Product(targets)),
            "parent-category" => Ok(Scope::ParentCategory(targets)),
            "category" => Ok(Scope::Category(targets)),
            "child-category" => Ok(Scope::ChildCategory(targets)),
            _ => Err(CampaignError::UnknownScopeType(kind)),
        }
    }
}

/// Strings as-is, numbers in their JSON spelling; anything else has no key.
pub(crate) fn key_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn numeric(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(Decimal::from_f64),
        },
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

fn timestamp_field(field: &'static str, raw: Option<&str>) -> Result<DateTime<Utc>, CampaignError> {
    let raw = raw.ok_or(CampaignError::MissingField(field))?;
    parse_timestamp(raw).ok_or_else(|| CampaignError::BadTimestamp { field, value: raw.to_string() })
}

/// RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC, or a bare date at midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) { return Some(dt.with_timezone(&Utc)); }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") { return Some(naive.and_utc()); }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

/// Outcome of converting a batch of raw campaign values.
#[derive(Clone, Debug, Default)]
pub struct ParsedCampaigns {
    pub campaigns: Vec<Campaign>,
    pub skipped: usize,
}

/// Converts every value it can; malformed entries are logged and counted.
pub fn parse_campaigns(values: impl IntoIterator<Item = Value>) -> ParsedCampaigns {
    let mut parsed = ParsedCampaigns::default();
    for (index, value) in values.into_iter().enumerate() {
        let converted = serde_json::from_value::<CampaignRecord>(value)
            .map_err(|e| CampaignError::Malformed(e.to_string()))
            .and_then(Campaign::try_from);
        match converted {
            Ok(c) => parsed.campaigns.push(c),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping campaign");
                parsed.skipped += 1;
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw() -> Value {
        json!({
            "_id": "c1", "name": "Eid Sale", "isActive": true,
            "startDate": "2025-03-01T00:00:00.000Z", "endDate": "2025-03-31T23:59:59.000Z",
            "discount": {"type": "percentage", "value": 20},
            "scope": {"type": "category", "target": ["Lawn Collection"]}
        })
    }

    #[test]
    fn test_parse_well_formed() {
        let parsed = parse_campaigns(vec![raw()]);
        assert_eq!(parsed.skipped, 0);
        let c = &parsed.campaigns[0];
        assert_eq!(c.id, "c1");
        assert_eq!(c.discount, Discount::Percentage(Decimal::new(20, 0)));
        assert_eq!(c.scope, Scope::Category(vec!["Lawn Collection".into()]));
        assert_eq!(c.start_date, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let mut no_scope = raw();
        no_scope.as_object_mut().unwrap().remove("scope");
        let mut no_value = raw();
        no_value["discount"] = json!({"type": "fixed"});
        let mut bad_date = raw();
        bad_date["endDate"] = json!("next tuesday");
        let mut unknown_scope = raw();
        unknown_scope["scope"]["type"] = json!("brand");
        let parsed = parse_campaigns(vec![no_scope, json!("garbage"), no_value, bad_date, unknown_scope, raw()]);
        assert_eq!(parsed.skipped, 5);
        assert_eq!(parsed.campaigns.len(), 1);
    }

    #[test]
    fn test_negative_value_clamped_to_zero() {
        let mut v = raw();
        v["discount"] = json!({"type": "fixed", "value": -50});
        let c = &parse_campaigns(vec![v]).campaigns[0];
        assert_eq!(c.discount, Discount::Fixed(Decimal::ZERO));
    }

    #[test]
    fn test_lenient_values() {
        let mut v = raw();
        v["discount"]["value"] = json!("12.5");
        v["isActive"] = Value::Null;
        v["scope"] = json!({"type": "product", "target": [101, "p2", null]});
        v["startDate"] = json!("2025-03-01");
        let c = &parse_campaigns(vec![v]).campaigns[0];
        assert_eq!(c.discount, Discount::Percentage(Decimal::new(125, 1)));
        assert!(!c.is_active);
        assert_eq!(c.scope, Scope::Product(vec!["101".into(), "p2".into()]));
    }

    #[test]
    fn test_missing_target_matches_nothing() {
        let scope = Scope::try_from(ScopeRecord { kind: Some("category".into()), target: None }).unwrap();
        let p = Product::new("p1", Price::zero()).with_category("Lawn Collection");
        assert!(!scope.matches(&p));
    }

    #[test]
    fn test_scope_keys() {
        let p = Product::new("p1", Price::zero()).with_gender("Women").with_category("Lawn Collection").with_child_category("2 Piece");
        assert!(Scope::All.matches(&p));
        assert!(Scope::Product(vec!["p1".into()]).matches(&p));
        assert!(Scope::ParentCategory(vec!["Women".into()]).matches(&p));
        assert!(!Scope::ParentCategory(vec!["Men".into()]).matches(&p));
        assert!(Scope::ChildCategory(vec!["2 Piece".into()]).matches(&p));
        assert!(!Scope::ChildCategory(vec!["2 Piece".into()]).matches(&Product::new("p2", Price::zero())));
    }

    #[test]
    fn test_window_is_inclusive() {
        let c = Campaign::try_from(serde_json::from_value::<CampaignRecord>(raw()).unwrap()).unwrap();
        assert!(c.is_live(c.start_date));
        assert!(c.is_live(c.end_date));
        assert!(!c.is_live(c.end_date + chrono::Duration::milliseconds(1)));
        assert!(!Campaign { is_active: false, ..c.clone() }.is_live(c.start_date));
    }

    #[test]
    fn test_discount_serializes_tagged() {
        assert_eq!(serde_json::to_value(Discount::Fixed(Decimal::new(150, 0))).unwrap(), json!({"type": "fixed", "value": 150.0}));
        assert_eq!(serde_json::to_value(Scope::All).unwrap(), json!({"type": "all"}));
    }
}
