//! Value Objects for pricing

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative amount in the store currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(PriceError::Negative(amount)); }
        Ok(Self(amount))
    }
    pub fn zero() -> Self { Self(Decimal::ZERO) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    /// Base minus `discount`, rounded to whole currency units and never below zero.
    pub fn after_discount(&self, discount: Decimal) -> Price {
        let Some(reduced) = self.0.checked_sub(discount) else { return *self };
        let reduced = reduced.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        if reduced.is_sign_negative() { Price::zero() } else { Price(reduced.normalize()) }
    }

    /// `percent` of this price, unrounded. Anything from 100 up is the whole price.
    pub fn percentage(&self, percent: Decimal) -> Decimal {
        if percent >= Decimal::ONE_HUNDRED { return self.0; }
        if percent.is_sign_negative() { return Decimal::ZERO; }
        (percent / Decimal::ONE_HUNDRED).checked_mul(self.0).unwrap_or(self.0)
    }
}

impl Default for Price { fn default() -> Self { Self::zero() } }

impl TryFrom<Decimal> for Price {
    type Error = PriceError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Price::new(value) }
}

impl From<Price> for Decimal { fn from(p: Price) -> Decimal { p.0 } }

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq)] pub enum PriceError { Negative(Decimal) }
impl std::error::Error for PriceError {}
impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Negative(v) => write!(f, "price cannot be negative: {}", v) }
    }
}
