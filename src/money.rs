use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{LedgerError, Result};

/// fixed precision base for fees: one unit is a hundredth of a percent
pub const PRECISION_BASE: u128 = 10_000;

/// Money type holding an unsigned amount in the smallest unit of its currency.
///
/// Only checked arithmetic is exposed. Overflow surfaces as
/// [`LedgerError::ArithmeticOverflow`], never as a wrapped value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Money(u128);

impl Money {
    pub const ZERO: Money = Money(0);
    pub const MAX: Money = Money(u128::MAX);

    /// create from minor units (cents, satoshis, etc)
    pub const fn new(amount: u128) -> Self {
        Money(amount)
    }

    /// get underlying amount
    pub const fn amount(&self) -> u128 {
        self.0
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Result<Money> {
        checked_add(self.0, other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Result<Money> {
        checked_sub(self.0, other.0).map(Money)
    }

    pub fn checked_mul(self, factor: u128) -> Result<Money> {
        checked_mul(self.0, factor).map(Money)
    }

    /// truncating division
    pub fn checked_div(self, divisor: u128) -> Result<Money> {
        checked_div(self.0, divisor).map(Money)
    }

    /// subtraction floored at zero, for "what is left to pay" style queries
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// checked sum of a sequence of amounts
    pub fn sum<I>(amounts: I) -> Result<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// apply a fee rate: `self * (PRECISION_BASE + bps) / PRECISION_BASE`
    pub fn with_fee(self, fee: Rate) -> Result<Money> {
        amount_due(self, fee)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Money(s.trim().parse()?))
    }
}

impl From<Money> for String {
    fn from(m: Money) -> String {
        m.0.to_string()
    }
}

impl TryFrom<String> for Money {
    type Error = std::num::ParseIntError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<u64> for Money {
    fn from(i: u64) -> Self {
        Money(u128::from(i))
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money(u128::from(i))
    }
}

/// fee rate in basis points (hundredths of a percent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate(u32);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    /// create from basis points (e.g., 500 for 5%)
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// create from whole percentage (e.g., 5 for 5%)
    pub fn from_percentage(p: u16) -> Self {
        Rate(u32::from(p) * 100)
    }

    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// get as decimal fraction (0.05 for 5%)
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(PRECISION_BASE as u64)
    }

    /// get as percentage (5.00 for 5%)
    pub fn as_percentage(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

/// principal plus fee, truncated toward zero
pub fn amount_due(principal: Money, fee: Rate) -> Result<Money> {
    let factor = checked_add(PRECISION_BASE, u128::from(fee.bps()))?;
    let scaled = checked_mul(principal.amount(), factor)?;
    checked_div(scaled, PRECISION_BASE).map(Money)
}

pub fn checked_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b)
        .ok_or(LedgerError::ArithmeticOverflow { operation: "add" })
}

pub fn checked_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b)
        .ok_or(LedgerError::ArithmeticOverflow { operation: "sub" })
}

pub fn checked_mul(a: u128, b: u128) -> Result<u128> {
    a.checked_mul(b)
        .ok_or(LedgerError::ArithmeticOverflow { operation: "mul" })
}

pub fn checked_div(a: u128, b: u128) -> Result<u128> {
    if b == 0 {
        return Err(LedgerError::DivisionByZero);
    }
    Ok(a / b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(1_000, 500, 1_050)]
    #[case(0, 500, 0)]
    #[case(0, u32::MAX, 0)]
    #[case(1_000, 0, 1_000)]
    #[case(999, 1, 999)] // 999.0999 truncated
    #[case(10_000, 1, 10_001)]
    #[case(1_000_000, 10_000, 2_000_000)]
    fn test_amount_due(#[case] principal: u128, #[case] bps: u32, #[case] expected: u128) {
        let due = amount_due(Money::new(principal), Rate::from_bps(bps)).unwrap();
        assert_eq!(due, Money::new(expected));
    }

    #[test]
    fn test_amount_due_overflow() {
        let err = amount_due(Money::MAX, Rate::from_bps(500)).unwrap_err();
        assert!(matches!(err, LedgerError::ArithmeticOverflow { operation: "mul" }));

        // just past the largest principal that still fits after scaling
        let limit = u128::MAX / 10_500;
        assert!(amount_due(Money::new(limit), Rate::from_bps(500)).is_ok());
        assert!(amount_due(Money::new(limit + 1), Rate::from_bps(500)).is_err());
    }

    #[test]
    fn test_checked_primitives() {
        assert_eq!(checked_add(1, 2).unwrap(), 3);
        assert!(checked_add(u128::MAX, 1).is_err());
        assert!(checked_sub(1, 2).is_err());
        assert!(matches!(checked_div(10, 0), Err(LedgerError::DivisionByZero)));
        assert_eq!(checked_div(10, 3).unwrap(), 3);
    }

    #[test]
    fn test_money_sum() {
        let total = Money::sum([Money::new(10), Money::new(20), Money::new(5)]).unwrap();
        assert_eq!(total, Money::new(35));

        let err = Money::sum([Money::MAX, Money::new(1)]).unwrap_err();
        assert!(matches!(err, LedgerError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_percentage(5);
        assert_eq!(rate.bps(), 500);
        assert_eq!(rate.as_decimal(), dec!(0.05));
        assert_eq!(rate.to_string(), "5.00%");
        assert_eq!(Rate::from_bps(125).as_percentage(), dec!(1.25));
    }

    #[test]
    fn test_money_serializes_as_string() {
        let json = serde_json::to_string(&Money::MAX).unwrap();
        assert_eq!(json, format!("\"{}\"", u128::MAX));
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::MAX);
    }
}
