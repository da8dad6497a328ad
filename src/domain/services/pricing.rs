//! Campaign discount resolution.
//!
//! Each product gets the single largest discount among the campaigns that are
//! live at `now` and whose scope covers it. Discounts never stack. On equal
//! amounts the campaign seen first in input order wins.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use crate::domain::aggregates::{AppliedCampaign, Campaign, PricedProduct, Product};

/// Prices every product against the campaigns live at `now`.
pub fn resolve(products: &[Product], campaigns: &[Campaign], now: DateTime<Utc>) -> Vec<PricedProduct> {
    let live = live_campaigns(campaigns, now);
    products.iter().map(|p| price_product(p, &live)).collect()
}

/// Campaigns that are active and inside their window, input order kept.
pub fn live_campaigns(campaigns: &[Campaign], now: DateTime<Utc>) -> Vec<&Campaign> {
    campaigns.iter().filter(|c| c.is_live(now)).collect()
}

/// The matching campaign with the largest discount amount for `product`.
pub fn best_offer<'a>(product: &Product, live: &[&'a Campaign]) -> Option<(&'a Campaign, Decimal)> {
    live.iter()
        .filter(|c| c.applies_to(product))
        .map(|c| (*c, c.discount_amount(product.price)))
        .fold(None, |best, (c, amount)| match best {
            Some((_, top)) if amount <= top => best,
            _ => Some((c, amount)),
        })
}

pub fn price_product(product: &Product, live: &[&Campaign]) -> PricedProduct {
    match best_offer(product, live) {
        Some((campaign, amount)) if amount > Decimal::ZERO => {
            let effective = product.price.after_discount(amount);
            PricedProduct::discounted(product, effective, AppliedCampaign::from_campaign(campaign, amount))
        }
        _ => PricedProduct::full_price(product),
    }
}
