//! Money amounts in major and minor currency units.
//!
//! Checkout payloads carry amounts in major units (rupees) as either JSON
//! numbers or numeric strings. The payment gateway only accepts integer
//! minor units (paise), so every amount passes through [`AmountPolicy`]
//! before it leaves the service.

use core::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default upper bound for a single payment: ₹100,000 in paise.
pub const DEFAULT_MAX_MINOR_UNITS: i64 = 10_000_000;

/// Errors produced while parsing or normalizing an amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// No amount was supplied.
    #[error("amount is required")]
    Missing,
    /// The supplied value does not parse as a number.
    #[error("amount must be a number (got {0})")]
    NotANumber(String),
    /// The amount is zero or negative, or rounds to zero minor units.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// The amount is below the configured minimum.
    #[error("amount must be at least {min}")]
    BelowMinimum {
        /// Minimum accepted amount in major units.
        min: Decimal,
    },
    /// The amount exceeds the configured maximum.
    #[error("amount exceeds maximum of {max} minor units")]
    ExceedsMaximum {
        /// Maximum accepted amount in minor units.
        max: i64,
    },
}

/// Currencies the service can charge in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    /// Indian rupee.
    #[default]
    #[serde(rename = "INR")]
    Inr,
}

impl Currency {
    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Inr => "INR",
        }
    }

    /// Number of minor units in one major unit.
    #[must_use]
    pub const fn minor_per_major(self) -> i64 {
        match self {
            Self::Inr => 100,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An integer amount in a currency's smallest unit (paise for INR).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    /// Wrap a raw minor-unit count.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw minor-unit count.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Convert back to major units for display.
    #[must_use]
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a major-unit amount from a JSON number or numeric string.
///
/// Strings are trimmed and may use scientific notation. Anything that does
/// not parse is rejected rather than coerced.
///
/// # Errors
///
/// Returns [`AmountError::Missing`] for `null`, and
/// [`AmountError::NotANumber`] for anything that is not numeric.
pub fn parse_major_amount(value: &Value) -> Result<Decimal, AmountError> {
    match value {
        Value::Null => Err(AmountError::Missing),
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) if s.trim().is_empty() => Err(AmountError::Missing),
        Value::String(s) => parse_decimal(s.trim()),
        other => Err(AmountError::NotANumber(other.to_string())),
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, AmountError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| AmountError::NotANumber(raw.to_owned()))
}

/// Bounds applied when converting a major-unit amount to minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountPolicy {
    /// Inclusive minimum in major units. `None` means "greater than zero".
    pub min_major: Option<Decimal>,
    /// Inclusive maximum in minor units.
    pub max_minor: i64,
    /// Currency the amount is charged in.
    pub currency: Currency,
}

impl Default for AmountPolicy {
    fn default() -> Self {
        Self {
            min_major: None,
            max_minor: DEFAULT_MAX_MINOR_UNITS,
            currency: Currency::Inr,
        }
    }
}

impl AmountPolicy {
    /// Convert a major-unit amount to minor units.
    ///
    /// Rounds half away from zero, so `499.995` becomes `50000` paise.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive, below the minimum,
    /// rounds to zero minor units, or exceeds the maximum.
    pub fn normalize(&self, major: Decimal) -> Result<MinorUnits, AmountError> {
        if major <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }

        if let Some(min) = self.min_major
            && major < min
        {
            return Err(AmountError::BelowMinimum { min });
        }

        let exceeds = AmountError::ExceedsMaximum {
            max: self.max_minor,
        };

        let minor = major
            .checked_mul(Decimal::from(self.currency.minor_per_major()))
            .ok_or_else(|| exceeds.clone())?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        let minor = minor.to_i64().ok_or_else(|| exceeds.clone())?;

        if minor <= 0 {
            return Err(AmountError::NotPositive);
        }
        if minor > self.max_minor {
            return Err(exceeds);
        }

        Ok(MinorUnits(minor))
    }

    /// Parse a JSON amount and convert it to minor units in one step.
    ///
    /// # Errors
    ///
    /// Returns any error from [`parse_major_amount`] or [`Self::normalize`].
    pub fn normalize_value(&self, value: &Value) -> Result<MinorUnits, AmountError> {
        self.normalize(parse_major_amount(value)?)
    }
}
