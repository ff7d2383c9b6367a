//! Token decimal places.

use crate::error::AmmError;

/// Largest supported number of decimal places.
const MAX_DECIMALS: u8 = 18;

/// Number of decimal places of a token, in `0..=18`.
///
/// Besides describing display precision, decimals drive the precision
/// multipliers that let a stable pool compare two tokens of different
/// scale unit for unit.
///
/// # Examples
///
/// ```
/// use tidepool::domain::Decimals;
///
/// let usdc = Decimals::new(6).expect("6 is valid");
/// let dai = Decimals::new(18).expect("18 is valid");
/// assert_eq!(usdc.precision_multiplier(dai), 1_000_000_000_000);
/// assert_eq!(dai.precision_multiplier(usdc), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decimals(u8);

impl Decimals {
    /// Zero decimal places.
    pub const ZERO: Self = Self(0);

    /// Eighteen decimal places.
    pub const MAX: Self = Self(MAX_DECIMALS);

    /// Creates a new `Decimals` value.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `value` exceeds 18.
    pub const fn new(value: u8) -> Result<Self, AmmError> {
        if value > MAX_DECIMALS {
            return Err(AmmError::InvalidConfiguration("decimals must be 0..=18"));
        }
        Ok(Self(value))
    }

    /// Returns the raw decimal count.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Returns `10^decimals`.
    #[must_use]
    pub const fn factor(&self) -> u128 {
        10u128.pow(self.0 as u32)
    }

    /// Multiplier that lifts an amount with these decimals onto the scale
    /// of `reference`: `10^(reference - self)`, or `1` if this token is
    /// already at least as precise.
    #[must_use]
    pub const fn precision_multiplier(&self, reference: Self) -> u128 {
        if reference.0 > self.0 {
            10u128.pow((reference.0 - self.0) as u32)
        } else {
            1
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn range_is_enforced() {
        assert!(Decimals::new(0).is_ok());
        assert!(Decimals::new(18).is_ok());
        assert!(matches!(
            Decimals::new(19),
            Err(AmmError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn factor_is_power_of_ten() {
        let Ok(d) = Decimals::new(6) else {
            panic!("valid decimals");
        };
        assert_eq!(d.factor(), 1_000_000);
        assert_eq!(Decimals::ZERO.factor(), 1);
    }

    #[test]
    fn multiplier_between_equal_decimals_is_one() {
        assert_eq!(Decimals::MAX.precision_multiplier(Decimals::MAX), 1);
    }
}
