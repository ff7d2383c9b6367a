//! Wide intermediate arithmetic.
//!
//! Products of two reserves, or of a staked balance and a reward index,
//! routinely exceed `u128`.  These helpers widen to [`BigUint`] for the
//! intermediate product and narrow the floored result back to `u128`,
//! failing instead of truncating.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::error::AmmError;

/// Computes `floor(a * b / c)` without intermediate overflow.
///
/// # Errors
///
/// - [`AmmError::DivisionByZero`] if `c` is zero.
/// - [`AmmError::Overflow`] if the quotient does not fit in `u128`.
///
/// # Examples
///
/// ```
/// use tidepool::math::mul_div;
///
/// assert_eq!(mul_div(u128::MAX, 6, 3), Err(tidepool::error::AmmError::Overflow("mul_div quotient")));
/// assert_eq!(mul_div(u128::MAX, 3, 6), Ok(u128::MAX / 2));
/// ```
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, AmmError> {
    if c == 0 {
        return Err(AmmError::DivisionByZero("mul_div denominator"));
    }
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / c);
    }
    let quotient = BigUint::from(a) * BigUint::from(b) / BigUint::from(c);
    quotient
        .to_u128()
        .ok_or(AmmError::Overflow("mul_div quotient"))
}

/// Integer square root of `n` via Newton's method, floored.
#[must_use]
pub fn isqrt(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = x.div_ceil(2);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}

/// Computes `floor(sqrt(a * b))` for any pair of `u128` values.
///
/// The root of a product of two `u128` values always fits in `u128`.
///
/// # Errors
///
/// Returns [`AmmError::Overflow`] only if that bound were violated.
pub fn sqrt_product(a: u128, b: u128) -> Result<u128, AmmError> {
    if let Some(product) = a.checked_mul(b) {
        return Ok(isqrt(product));
    }
    let product = BigUint::from(a) * BigUint::from(b);
    if product.is_zero() {
        return Ok(0);
    }
    product
        .sqrt()
        .to_u128()
        .ok_or(AmmError::Overflow("sqrt_product root"))
}
