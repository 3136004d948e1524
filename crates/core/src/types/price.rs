//! Unit price using decimal arithmetic.
//!
//! Prices travel to and from the backend as JSON numbers (`"harga_satuan": 10.5`)
//! and are displayed in Indonesian Rupiah notation (`Rp 10.500`, `Rp 10,5`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// No value was entered.
    #[error("price cannot be empty")]
    Empty,
    /// The value is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The value is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Maximum fraction digits shown by [`Price::to_rupiah`].
    const DISPLAY_FRACTION_DIGITS: u32 = 3;

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_zero() {
            return Ok(Self(Decimal::ZERO));
        }
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a price typed into a form field.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] for empty, non-numeric or negative input.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(s).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format as Rupiah with `.` thousands separators and `,` decimals.
    ///
    /// ```
    /// use stockroom_core::Price;
    ///
    /// assert_eq!(Price::parse("1250000").unwrap().to_rupiah(), "Rp 1.250.000");
    /// assert_eq!(Price::parse("10.5").unwrap().to_rupiah(), "Rp 10,5");
    /// ```
    #[must_use]
    pub fn to_rupiah(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(
                Self::DISPLAY_FRACTION_DIGITS,
                RoundingStrategy::MidpointAwayFromZero,
            )
            .normalize();
        let text = rounded.to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

        let mut out = format!("Rp {}", group_thousands(whole));
        if !fraction.is_empty() {
            out.push(',');
            out.push_str(fraction);
        }
        out
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = rust_decimal::serde::float::deserialize(deserializer)?;
        Self::new(amount).map_err(de::Error::custom)
    }
}
