//! Precision-safe decimal types for order fields.
//!
//! Prices and quantities are carried as `rust_decimal::Decimal` so the
//! values written to the wire are exactly what the caller supplied.

use crate::error::{CoreError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    /// Parse a price field.
    pub fn parse(value: &str) -> Result<Self> {
        parse_field("price", value).map(Self)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order quantity with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(pub Decimal);

impl Quantity {
    /// Parse a quantity field.
    pub fn parse(value: &str) -> Result<Self> {
        parse_field("quantity", value).map(Self)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim()).map_err(|_| CoreError::InvalidNumericField {
        field,
        value: value.to_string(),
    })
}
