//! Common types used throughout the resource-plan engine

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RpError, RpResult};

/// Decimal places kept for every resolved monetary value
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Largest cost, rate, percentage or weekly hours value accepted from input
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Record identifier.
///
/// Upstream payloads carry ids either as JSON numbers or strings, and the same
/// id can show up in both shapes (`7` on a role rate, `"7"` on the estimate).
/// Ids are therefore stored and compared as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i32> for RecordId {
    fn from(value: i32) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => RecordId(s),
            Raw::Signed(n) => RecordId(n.to_string()),
            Raw::Unsigned(n) => RecordId(n.to_string()),
        })
    }
}

/// ISO-4217 style currency code, normalised to upper case so that `"eur"`
/// and `"EUR"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

/// Inclusive date range (start_date to end_date)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A range whose end precedes its start contains nothing.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        !self.is_empty() && self.start <= date && date <= self.end
    }

    /// Whether `[from, to]` shares at least one day with this range
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        !self.is_empty() && from <= to && from <= self.end && to >= self.start
    }

    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Round a monetary value to two decimal places, midpoint away from zero.
/// The result always carries exactly two places (`50` becomes `50.00`).
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_DECIMAL_PLACES);
    rounded
}

/// Parse a user-entered amount (cost, rate, hours, percentage).
///
/// Blank input means zero. Non-numeric, negative and oversized values (above
/// [`MAX_AMOUNT`]) are rejected here so they never reach the rollup.
pub fn parse_amount(field: &str, raw: &str) -> RpResult<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let invalid = || RpError::InvalidNumericInput {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let value = Decimal::from_str(trimmed).map_err(|_| invalid())?;
    if (value.is_sign_negative() && !value.is_zero()) || value > MAX_AMOUNT {
        return Err(invalid());
    }
    Ok(value.normalize())
}
