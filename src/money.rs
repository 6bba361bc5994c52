//! Exact money amounts.
//!
//! Amounts wrap [rust_decimal::Decimal] so that arithmetic never suffers from
//! floating point rounding. In the database they are stored as integer minor
//! units (e.g. cents), which keeps SQL arithmetic such as
//! `current_balance + ?1` and `SUM(amount)` exact as well.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Neg, Sub},
};

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize, Serializer};

use crate::Error;

/// The number of fractional digits an amount may have.
pub const MINOR_UNIT_DIGITS: u32 = 2;

/// A signed amount of money with at most [MINOR_UNIT_DIGITS] fractional digits.
///
/// Serialised as a decimal string with two fractional digits (e.g. `"12.50"`)
/// and deserialised from either a JSON number or a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// No money at all.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create an amount from a decimal.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if `amount` has more than
    /// [MINOR_UNIT_DIGITS] fractional digits.
    pub fn new(amount: Decimal) -> Result<Self, Error> {
        let money = Self(amount);
        money.check_precision()?;

        Ok(money)
    }

    /// Create an amount from a whole number of minor units, e.g. cents.
    pub fn from_minor_units(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, MINOR_UNIT_DIGITS))
    }

    /// The amount as a whole number of minor units.
    ///
    /// Returns `None` if the amount has too many fractional digits or does
    /// not fit into an `i64`.
    pub fn minor_units(&self) -> Option<i64> {
        if !self.has_valid_precision() {
            return None;
        }

        self.0
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|minor_units| minor_units.to_i64())
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// The underlying decimal.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Check that the amount can be stored without losing precision.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if there are more than
    /// [MINOR_UNIT_DIGITS] fractional digits, or if the amount is too large
    /// to be stored as an `i64` number of minor units.
    pub fn check_precision(&self) -> Result<(), Error> {
        if !self.has_valid_precision() {
            return Err(Error::InvalidAmount(format!(
                "{} has more than {MINOR_UNIT_DIGITS} decimal places",
                self.0
            )));
        }

        match self.minor_units() {
            Some(_) => Ok(()),
            None => Err(Error::InvalidAmount(format!("{} is too large", self.0))),
        }
    }

    /// Add `other` to this amount, or `None` if the sum cannot be stored.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        let sum = self.minor_units()?.checked_add(other.minor_units()?)?;

        Some(Money::from_minor_units(sum))
    }

    fn has_valid_precision(&self) -> bool {
        self.0.normalize().scale() <= MINOR_UNIT_DIGITS
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Decimal> for Money {
    /// Rounds `value` to [MINOR_UNIT_DIGITS] fractional digits.
    fn from(value: Decimal) -> Self {
        Self(value.round_dp(MINOR_UNIT_DIGITS))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let minor_units = self.minor_units().ok_or_else(|| {
            rusqlite::Error::ToSqlConversionFailure(
                format!("{} cannot be stored as minor units", self.0).into(),
            )
        })?;

        Ok(ToSqlOutput::from(minor_units))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money::from_minor_units)
    }
}
