use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency code every amount in a mobile-money notification is quoted in.
pub const CURRENCY: &str = "RWF";

/// A non-negative mobile-money amount, kept to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(Decimal);

impl TryFrom<Decimal> for Amount {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value).ok_or_else(|| format!("amount out of range: {value}"))
    }
}

impl Amount {
    /// Returns `None` for negative values or values too large to store.
    pub fn new(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return None;
        }
        let value = value.round_dp(2);
        // Hundredths must fit the i64 column the store uses.
        value.checked_mul(Decimal::from(100))?.to_i64()?;
        Some(Amount(value))
    }

    pub fn from_units(units: u32) -> Self {
        Amount(Decimal::from(units))
    }

    pub fn from_cents(cents: i64) -> Option<Self> {
        if cents < 0 {
            return None;
        }
        Some(Amount(Decimal::from(cents) / Decimal::from(100)))
    }

    /// Every constructor checks the range, so the fallback is unreachable.
    pub fn to_cents(self) -> i64 {
        self.0
            .checked_mul(Decimal::from(100))
            .and_then(|cents| cents.to_i64())
            .unwrap_or(i64::MAX)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {CURRENCY}", self.0.normalize())
    }
}
