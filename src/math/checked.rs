//! Checked arithmetic for the quantity newtypes.
//!
//! [`CheckedArithmetic`] turns the `Option`-returning checked operations
//! of [`Amount`] and [`Shares`] into [`AmmError`]s, so state transitions
//! can chain them with `?` and abort cleanly on the first failure.
//!
//! ```
//! use tidepool::domain::Amount;
//! use tidepool::math::CheckedArithmetic;
//!
//! let reserve = Amount::new(1_000);
//! assert!(reserve.safe_sub(&Amount::new(1_001)).is_err());
//! ```

use crate::domain::{Amount, Shares};
use crate::error::AmmError;

/// Fallible arithmetic with typed errors.
///
/// No operation panics, wraps or saturates.
pub trait CheckedArithmetic: Sized {
    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Overflow`] on overflow.
    fn safe_add(&self, other: &Self) -> Result<Self, AmmError>;

    /// Checked subtraction.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Underflow`] if the result would be negative.
    fn safe_sub(&self, other: &Self) -> Result<Self, AmmError>;

    /// Checked multiplication.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Overflow`] on overflow.
    fn safe_mul(&self, other: &Self) -> Result<Self, AmmError>;

    /// Floor division.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::DivisionByZero`] if `other` is zero.
    fn safe_div(&self, other: &Self) -> Result<Self, AmmError>;
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

impl CheckedArithmetic for Amount {
    #[inline]
    fn safe_add(&self, other: &Self) -> Result<Self, AmmError> {
        self.checked_add(other)
            .ok_or(AmmError::Overflow("amount addition"))
    }

    #[inline]
    fn safe_sub(&self, other: &Self) -> Result<Self, AmmError> {
        self.checked_sub(other)
            .ok_or(AmmError::Underflow("amount subtraction"))
    }

    #[inline]
    fn safe_mul(&self, other: &Self) -> Result<Self, AmmError> {
        self.checked_mul(other)
            .ok_or(AmmError::Overflow("amount multiplication"))
    }

    #[inline]
    fn safe_div(&self, other: &Self) -> Result<Self, AmmError> {
        self.checked_div(other)
            .ok_or(AmmError::DivisionByZero("amount division"))
    }
}

// ---------------------------------------------------------------------------
// Shares
// ---------------------------------------------------------------------------

impl CheckedArithmetic for Shares {
    #[inline]
    fn safe_add(&self, other: &Self) -> Result<Self, AmmError> {
        self.checked_add(other)
            .ok_or(AmmError::Overflow("share addition"))
    }

    #[inline]
    fn safe_sub(&self, other: &Self) -> Result<Self, AmmError> {
        self.checked_sub(other)
            .ok_or(AmmError::Underflow("share subtraction"))
    }

    #[inline]
    fn safe_mul(&self, other: &Self) -> Result<Self, AmmError> {
        self.get()
            .checked_mul(other.get())
            .map(Shares::new)
            .ok_or(AmmError::Overflow("share multiplication"))
    }

    #[inline]
    fn safe_div(&self, other: &Self) -> Result<Self, AmmError> {
        self.get()
            .checked_div(other.get())
            .map(Shares::new)
            .ok_or(AmmError::DivisionByZero("share division"))
    }
}
