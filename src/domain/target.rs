//! Oracle rate target for stable pools.

use core::fmt;

use crate::error::AmmError;

/// Number of fractional bits in a [`Target`].
pub const TARGET_FRACTIONAL_BITS: u32 = 48;

/// The oracle's exchange-rate target: how many units of token A one unit
/// of token B is worth, as a fixed-point number with 48 fractional bits.
///
/// `Target::PARITY` (`1 << 48`) means one-to-one.  The raw layout matches
/// the bits of an `I80F48`, see `math::fixed_precision` under the
/// `fixed-point` feature.
///
/// # Examples
///
/// ```
/// use tidepool::domain::Target;
///
/// let t = Target::from_ratio(3, 2).expect("non-zero denominator");
/// assert_eq!(t.bits(), 3 * (1u128 << 48) / 2);
/// assert!(Target::PARITY < t);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target(u128);

impl Target {
    /// One unit of B is worth one unit of A.
    pub const PARITY: Self = Self(1u128 << TARGET_FRACTIONAL_BITS);

    /// Wraps raw fixed-point bits.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `bits` is zero.
    pub const fn from_bits(bits: u128) -> Result<Self, AmmError> {
        if bits == 0 {
            return Err(AmmError::InvalidConfiguration("rate target must be positive"));
        }
        Ok(Self(bits))
    }

    /// Builds `numerator / denominator` with 48 fractional bits, floored.
    ///
    /// # Errors
    ///
    /// - [`AmmError::DivisionByZero`] if `denominator` is zero.
    /// - [`AmmError::Overflow`] if the scaled numerator does not fit.
    /// - [`AmmError::InvalidConfiguration`] if the result is zero.
    pub fn from_ratio(numerator: u128, denominator: u128) -> Result<Self, AmmError> {
        if denominator == 0 {
            return Err(AmmError::DivisionByZero("rate target denominator"));
        }
        let scaled = numerator
            .checked_mul(1u128 << TARGET_FRACTIONAL_BITS)
            .ok_or(AmmError::Overflow("rate target numerator"))?;
        Self::from_bits(scaled / denominator)
    }

    /// Returns the raw fixed-point bits.
    #[must_use]
    pub const fn bits(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 >> TARGET_FRACTIONAL_BITS;
        let frac = self.0 & ((1u128 << TARGET_FRACTIONAL_BITS) - 1);
        // six decimal digits of the fractional part
        let micro = (frac * 1_000_000) >> TARGET_FRACTIONAL_BITS;
        write!(f, "{whole}.{micro:06}")
    }
}
