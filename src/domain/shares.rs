//! Liquidity share quantities.

use core::fmt;

/// A quantity of pool or vault shares.
///
/// Shares are a distinct type from [`Amount`](super::Amount) so that a
/// share balance can never be passed where a token quantity is expected.
///
/// # Examples
///
/// ```
/// use tidepool::domain::Shares;
///
/// let s = Shares::new(999_000);
/// assert_eq!(s.checked_add(&Shares::new(1_000)), Some(Shares::new(1_000_000)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Shares(u128);

impl Shares {
    /// Zero shares.
    pub const ZERO: Self = Self(0);

    /// Creates a new `Shares` value.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the raw share count.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Returns `true` if there are no shares.
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

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(&self, other: &Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Display for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let s = Shares::new(10);
        assert_eq!(s.checked_sub(&Shares::new(11)), None);
        assert_eq!(s.checked_sub(&Shares::new(10)), Some(Shares::ZERO));
        assert_eq!(Shares::new(u128::MAX).checked_add(&s), None);
    }

    #[test]
    fn zero_and_display() {
        assert!(Shares::ZERO.is_zero());
        assert_eq!(Shares::new(5).to_string(), "5");
    }
}
