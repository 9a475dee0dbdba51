// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, money, prices, sides, timestamps. each is a newtype so the compiler catches type mixups.
// all money/price/ratio quantities are Decimal-backed, 18 fractional digits by convention.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OracleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl AccountId {
    // the anonymous caller. per-account views return empty for it instead of failing.
    pub const ZERO: AccountId = AccountId(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// Long = profit when the rate goes up. Short = profit when the rate goes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_is_long(is_long: bool) -> Self {
        if is_long {
            Side::Long
        } else {
            Side::Short
        }
    }

    pub fn sign(&self) -> Decimal {
        match self {
            Side::Long => dec!(1),
            Side::Short => dec!(-1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Side::Long => Side::Short,
            Side::Short => Side::Long,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Side::Long)
    }
}

// 1.1: trading-token amount. collateral, notional, fees, pnl, rewards all use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote(Decimal);

impl Quote {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    pub fn add(&self, other: Quote) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Quote) -> Self {
        Self(self.0 - other.0)
    }

    pub fn mul(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }

    pub fn negate(&self) -> Self {
        Self(-self.0)
    }

    pub fn max(&self, other: Quote) -> Self {
        Self(self.0.max(other.0))
    }

    pub fn min(&self, other: Quote) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Quote {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quote {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Sum for Quote {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, q| acc.add(q))
    }
}

impl<'a> Sum<&'a Quote> for Quote {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, q| acc.add(*q))
    }
}

// 1.2: a reference rate. must be positive; the risk table sets the hard floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.3: millisecond timestamp. the engine holds a logical clock; nothing reads the wall clock
// on a committed path, so every run is replayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn elapsed_secs(&self, later: Timestamp) -> Decimal {
        let diff_ms = (later.0 - self.0).max(0);
        Decimal::new(diff_ms, 0) / dec!(1000)
    }

    pub fn plus_secs(&self, secs: i64) -> Timestamp {
        Timestamp(self.0 + secs * 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_signs() {
        assert_eq!(Side::Long.sign(), dec!(1));
        assert_eq!(Side::Short.sign(), dec!(-1));
        assert_eq!(Side::Long.opposite(), Side::Short);
    }

    #[test]
    fn quote_arithmetic() {
        let a = Quote::new(dec!(100));
        let b = Quote::new(dec!(30));
        assert_eq!(a.sub(b).value(), dec!(70));
        assert_eq!(a.mul(dec!(0.5)).value(), dec!(50));
        assert!(Quote::new(dec!(-1)).is_negative());
    }

    #[test]
    fn price_rejects_non_positive() {
        assert!(Price::new(dec!(0)).is_none());
        assert!(Price::new(dec!(-1)).is_none());
        assert!(Price::new(dec!(1.17)).is_some());
    }

    #[test]
    fn timestamp_elapsed() {
        let t0 = Timestamp::from_millis(1_000);
        let t1 = t0.plus_secs(150);
        assert_eq!(t0.elapsed_secs(t1), dec!(150));
        // negative intervals clamp to zero
        assert_eq!(t1.elapsed_secs(t0), dec!(0));
    }

    #[test]
    fn zero_account_is_anonymous() {
        assert!(AccountId::ZERO.is_zero());
        assert!(!AccountId(7).is_zero());
    }
}
