//! Price type for book prices
//!
//! Internally stores amounts in cents (i64) to avoid floating-point precision
//! issues, so exported prices read back to exactly the same value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A book price stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Create a price from cents
    ///
    /// # Examples
    /// ```
    /// use bookshelf::models::Price;
    /// let price = Price::from_cents(2990); // 29.90
    /// assert_eq!(price.to_plain_string(), "29.90");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole units portion (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Get the cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Check if the amount is negative
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a price from user or CSV input
    ///
    /// Accepts "29.90", "29,90", "R$ 29,90", "$29.90", "29" and "-5.00".
    /// More than two fractional digits are rounded half-up to cents.
    pub fn parse(s: &str) -> Result<Self, PriceParseError> {
        let invalid = || PriceParseError::InvalidFormat(s.trim().to_string());

        let cleaned: String = s
            .trim()
            .replace("R$", "")
            .replace('$', "")
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();

        let (negative, body) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        let (units_str, frac_str) = match body.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (body, ""),
        };

        if units_str.is_empty() && frac_str.is_empty() {
            return Err(invalid());
        }

        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(units_str) || !all_digits(frac_str) {
            return Err(invalid());
        }

        let units: i64 = if units_str.is_empty() {
            0
        } else {
            units_str.parse().map_err(|_| invalid())?
        };

        let digits: Vec<i64> = frac_str
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(i64::from)
            .collect();
        let tenths = digits.first().copied().unwrap_or(0);
        let hundredths = digits.get(1).copied().unwrap_or(0);
        let round_up = digits.get(2).is_some_and(|d| *d >= 5);

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(invalid)?;

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Plain decimal with two fractional digits, as written to CSV
    pub fn to_plain_string(&self) -> String {
        if self.is_negative() {
            format!("-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            format!("{}.{:02}", self.units(), self.cents_part())
        }
    }

    /// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{} {}.{:02}", symbol, self.units().abs(), self.cents_part())
        } else {
            format!("{} {}.{:02}", symbol, self.units(), self.cents_part())
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_plain_string())
    }
}

/// Error type for price parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceParseError {
    InvalidFormat(String),
}

impl fmt::Display for PriceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceParseError::InvalidFormat(s) => write!(f, "Invalid price format: {:?}", s),
        }
    }
}

impl std::error::Error for PriceParseError {}
