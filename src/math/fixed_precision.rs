//! Interoperation between [`Target`] and the `fixed` crate.
//!
//! Only available with the `fixed-point` feature.  A [`Target`] and an
//! [`I80F48`] share the same layout (48 fractional bits), so conversion is
//! a reinterpretation of the raw bits with range checks.
//!
//! ```
//! use fixed::types::I80F48;
//! use tidepool::domain::Target;
//! use tidepool::math::{target_from_fixed, target_to_fixed};
//!
//! let t = target_from_fixed(I80F48::from_num(1.5)).expect("positive");
//! assert_eq!(t, Target::from_ratio(3, 2).expect("valid"));
//! assert_eq!(target_to_fixed(t), Ok(I80F48::from_num(1.5)));
//! ```

use fixed::types::I80F48;

use crate::domain::Target;
use crate::error::AmmError;

/// Converts a positive `I80F48` rate into a [`Target`].
///
/// # Errors
///
/// Returns [`AmmError::InvalidConfiguration`] if `value` is zero or negative.
pub fn target_from_fixed(value: I80F48) -> Result<Target, AmmError> {
    let bits = u128::try_from(value.to_bits())
        .map_err(|_| AmmError::InvalidConfiguration("rate target must be positive"))?;
    Target::from_bits(bits)
}

/// Converts a [`Target`] into an `I80F48`.
///
/// # Errors
///
/// Returns [`AmmError::Overflow`] if the target exceeds the `I80F48` range.
pub fn target_to_fixed(target: Target) -> Result<I80F48, AmmError> {
    let bits = i128::try_from(target.bits())
        .map_err(|_| AmmError::Overflow("rate target exceeds I80F48"))?;
    Ok(I80F48::from_bits(bits))
}
