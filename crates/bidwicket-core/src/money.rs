// Exact money amounts for auction prices and purses.
//
// Amounts are quoted in crore but stored as whole lakhs (1 crore = 100 lakh),
// so bid increments like 0.5 accumulate without float drift.

use std::fmt;
use std::iter::Sum;
use std::ops;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lakhs per crore.
const LAKHS_PER_CRORE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoneyError {
    #[error("amount must be a finite number, got {0}")]
    NotFinite(f64),

    #[error("amount must not be negative, got {0}")]
    Negative(f64),

    #[error("amount {0} crore is too large")]
    Overflow(f64),
}

/// A non-negative amount of money, stored in lakhs.
///
/// Serializes as a decimal crore value (`2.5`), which is also the unit used
/// in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "f64")]
pub struct Money(u32);

impl Money {
    /// Zero rupees.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from a whole number of lakhs.
    pub const fn from_lakhs(lakhs: u32) -> Self {
        Self(lakhs)
    }

    /// Creates an amount from a decimal crore value, rounded to the nearest lakh.
    pub fn from_crore(crore: f64) -> Result<Self, MoneyError> {
        if !crore.is_finite() {
            return Err(MoneyError::NotFinite(crore));
        }
        if crore < 0.0 {
            return Err(MoneyError::Negative(crore));
        }
        let lakhs = (crore * f64::from(LAKHS_PER_CRORE)).round();
        if lakhs > f64::from(u32::MAX) {
            return Err(MoneyError::Overflow(crore));
        }
        Ok(Self(lakhs as u32))
    }

    /// The amount in lakhs.
    pub fn lakhs(&self) -> u32 {
        self.0
    }

    /// The amount as a decimal crore value.
    pub fn as_crore(&self) -> f64 {
        f64::from(self.0) / f64::from(LAKHS_PER_CRORE)
    }

    /// Subtraction that fails instead of going below zero.
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Addition that fails on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Money::from_crore(value)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.as_crore()
    }
}

impl ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl ops::Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    /// Formats as crore with two decimals, e.g. `₹2.50 Cr`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "₹{}.{:02} Cr",
            self.0 / LAKHS_PER_CRORE,
            self.0 % LAKHS_PER_CRORE
        )
    }
}
