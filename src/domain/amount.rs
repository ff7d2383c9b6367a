//! Raw token amount with checked arithmetic.

use core::fmt;

/// A raw token amount in the token's smallest unit.
///
/// `Amount` never interprets decimals; that is the job of
/// [`Token`](super::Token).  Arithmetic is checked and returns `None`
/// instead of wrapping, so every caller decides which [`AmmError`]
/// a failure maps to.
///
/// Division always floors.  Fees, minted shares and payouts are all
/// rounded in the protocol's favour.
///
/// [`AmmError`]: crate::error::AmmError
///
/// # Examples
///
/// ```
/// use tidepool::domain::Amount;
///
/// let a = Amount::new(100);
/// let b = Amount::new(30);
/// assert_eq!(a.checked_sub(&b), Some(Amount::new(70)));
/// assert_eq!(a.checked_div(&b), Some(Amount::new(3)));
/// assert_eq!(b.checked_sub(&a), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Amount(u128);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u128::MAX);

    /// Creates a new `Amount` from a raw `u128` value.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the underlying `u128` value.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(&self, other: &Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` if `other > self`.
    #[must_use]
    pub const fn checked_sub(&self, other: &Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_mul(&self, other: &Self) -> Option<Self> {
        match self.0.checked_mul(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Floor division. Returns `None` if `divisor` is zero.
    #[must_use]
    pub const fn checked_div(&self, divisor: &Self) -> Option<Self> {
        match self.0.checked_div(divisor.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_and_default() {
        assert_eq!(Amount::ZERO.get(), 0);
        assert_eq!(Amount::MAX.get(), u128::MAX);
        assert_eq!(Amount::default(), Amount::ZERO);
        assert!(Amount::ZERO.is_zero());
        assert!(!Amount::new(1).is_zero());
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Amount::new(1_000_000)), "1000000");
    }

    #[test]
    fn add_overflow() {
        assert_eq!(Amount::MAX.checked_add(&Amount::new(1)), None);
        assert_eq!(
            Amount::new(2).checked_add(&Amount::new(3)),
            Some(Amount::new(5))
        );
    }

    #[test]
    fn sub_underflow() {
        assert_eq!(Amount::new(1).checked_sub(&Amount::new(2)), None);
        assert_eq!(Amount::new(2).checked_sub(&Amount::new(2)), Some(Amount::ZERO));
    }

    #[test]
    fn mul_overflow() {
        assert_eq!(Amount::MAX.checked_mul(&Amount::new(2)), None);
        assert_eq!(
            Amount::new(6).checked_mul(&Amount::new(7)),
            Some(Amount::new(42))
        );
    }

    #[test]
    fn div_floors() {
        assert_eq!(Amount::new(7).checked_div(&Amount::new(2)), Some(Amount::new(3)));
        assert_eq!(Amount::new(7).checked_div(&Amount::ZERO), None);
    }
}
