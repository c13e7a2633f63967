//! # Token Amounts
//!
//! Token quantities in the smallest indivisible unit (18 decimals for the
//! tokens this workspace migrates). Stored as `u128`, which makes negative
//! balances unrepresentable, and serialized as a decimal string because
//! JSON numbers cannot carry 10^18-scale integers faithfully.
//!
//! Parsing accepts plain decimal digits and the `<mantissa>e<exponent>`
//! shorthand (`10e18`) commonly used when quoting token amounts.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A non-negative token quantity in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(u128);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from base units.
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// The raw number of base units.
    pub const fn units(&self) -> u128 {
        self.0
    }

    /// Whether the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Checked subtraction. `None` if `rhs > self`.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl FromStr for Amount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidAmount {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (mantissa, exponent) = match s.split_once(['e', 'E']) {
            Some((m, e)) => (m, Some(e)),
            None => (s, None),
        };
        if mantissa.is_empty() || !mantissa.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected decimal digits"));
        }
        let base: u128 = mantissa
            .parse()
            .map_err(|_| invalid("exceeds 128-bit range"))?;
        let Some(exponent) = exponent else {
            return Ok(Self(base));
        };
        if exponent.is_empty() || !exponent.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("exponent must be decimal digits"));
        }
        let exp: u32 = exponent
            .parse()
            .map_err(|_| invalid("exponent out of range"))?;
        10u128
            .checked_pow(exp)
            .and_then(|scale| base.checked_mul(scale))
            .map(Self)
            .ok_or_else(|| invalid("exceeds 128-bit range"))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
