//! Reciprocal-fraction fees.

use core::fmt;

use super::Amount;
use crate::error::AmmError;

/// A fee expressed as the divisor `d` of `amount / d`.
///
/// A divisor of `500` charges 0.2%, `1000` charges 0.1%.  The fee is
/// truncated towards zero, so small amounts can pay no fee at all; callers
/// that must never run fee-free check the result for zero.
///
/// # Examples
///
/// ```
/// use tidepool::domain::{Amount, FeeDivisor};
///
/// let fee = FeeDivisor::new(500).expect("non-zero");
/// assert_eq!(fee.apply(Amount::new(1_000)), Amount::new(2));
/// assert_eq!(fee.apply(Amount::new(499)), Amount::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeeDivisor(u128);

impl FeeDivisor {
    /// Creates a fee divisor.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::DivisionByZero`] if `divisor` is zero.
    pub const fn new(divisor: u128) -> Result<Self, AmmError> {
        if divisor == 0 {
            return Err(AmmError::DivisionByZero("fee divisor must be non-zero"));
        }
        Ok(Self(divisor))
    }

    /// Returns the raw divisor.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Returns `amount / divisor`, floored.
    pub const fn apply(&self, amount: Amount) -> Amount {
        Amount::new(amount.get() / self.0)
    }
}

impl fmt::Display for FeeDivisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn zero_divisor_rejected() {
        assert!(matches!(
            FeeDivisor::new(0),
            Err(AmmError::DivisionByZero(_))
        ));
    }

    #[test]
    fn apply_floors() {
        let Ok(fee) = FeeDivisor::new(8) else {
            panic!("valid divisor");
        };
        assert_eq!(fee.apply(Amount::new(15)), Amount::new(1));
        assert_eq!(fee.apply(Amount::new(16)), Amount::new(2));
        assert_eq!(fee.to_string(), "1/8");
    }
}
