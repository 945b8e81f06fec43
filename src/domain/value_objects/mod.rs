//! Value Objects for the sweet shop

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account name, trimmed, 1..=50 characters
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ValueError::EmptyUsername); }
        if value.chars().count() > 50 { return Err(ValueError::UsernameTooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for Username {
    type Error = ValueError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Username> for String {
    fn from(value: Username) -> Self { value.0 }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Unit price, never negative
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, ValueError> {
        if amount.is_sign_negative() && !amount.is_zero() { return Err(ValueError::NegativePrice); }
        Ok(Self(amount))
    }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn multiply(&self, qty: Quantity) -> Decimal { self.0 * Decimal::from(qty.value()) }
}

impl TryFrom<Decimal> for Price {
    type Error = ValueError;
    fn try_from(value: Decimal) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self { value.0 }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Units on hand or units requested
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub const fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: Quantity) -> Option<Self> { self.0.checked_add(other.0).map(Self) }
    pub fn subtract(&self, other: Quantity) -> Option<Self> { self.0.checked_sub(other.0).map(Self) }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl TryFrom<i64> for Quantity {
    type Error = ValueError;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self).map_err(|_| ValueError::QuantityOutOfRange(value))
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self { i64::from(value.0) }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError { EmptyUsername, UsernameTooLong, NegativePrice, QuantityOutOfRange(i64) }
impl std::error::Error for ValueError {}
impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username is required"),
            Self::UsernameTooLong => write!(f, "username must be at most 50 characters"),
            Self::NegativePrice => write!(f, "price must not be negative"),
            Self::QuantityOutOfRange(v) => write!(f, "quantity {v} is out of range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_username_trims() { assert_eq!(Username::new("  alice ").unwrap().as_str(), "alice"); }
    #[test]
    fn test_username_rejects_blank() { assert_eq!(Username::new("   "), Err(ValueError::EmptyUsername)); }
    #[test]
    fn test_price_rejects_negative() {
        assert!(Price::new(Decimal::new(-1, 2)).is_err());
        assert!(Price::new(Decimal::ZERO).is_ok());
    }
    #[test]
    fn test_price_multiply() {
        let p = Price::new(Decimal::new(250, 2)).unwrap();
        assert_eq!(p.multiply(Quantity::new(3)), Decimal::new(750, 2));
    }
    #[test]
    fn test_quantity_arithmetic() {
        let q = Quantity::new(5);
        assert_eq!(q.subtract(Quantity::new(5)), Some(Quantity::new(0)));
        assert_eq!(q.subtract(Quantity::new(6)), None);
        assert_eq!(Quantity::new(u32::MAX).add(Quantity::ONE), None);
    }
    #[test]
    fn test_quantity_from_negative() { assert!(Quantity::try_from(-3i64).is_err()); }
    #[test]
    fn test_price_deserialize_negative_fails() {
        assert!(serde_json::from_str::<Price>("-2.5").is_err());
        assert_eq!(serde_json::from_str::<Price>("2.5").unwrap().amount(), Decimal::new(25, 1));
    }
}
