//! Flat-curve utility solver for stable pools.
//!
//! Stable pools price trades against the utility
//!
//! ```text
//! U(x, y) = |(x + y)^8 - (x - y)^8|
//! ```
//!
//! which is almost constant-sum near `x = y` and bends towards
//! constant-product away from it.  Given a trade `dx`, the solver looks for
//! the `dy` that keeps `U(x + dx, y - dy)` equal to `U(x, y)`.
//!
//! # Algorithm
//!
//! Exactly [`NEWTON_ROUNDS`] Newton steps starting from `dy = 0`:
//!
//! ```text
//! dy += |U(x + dx, |y - dy|) - U(x, y)| / dU/dy(x + dx, |y - dy|)
//! ```
//!
//! There is no convergence test; the step count bounds the cost of a
//! trade.  The eighth powers are evaluated on [`BigInt`] so nothing
//! overflows.
//!
//! # Scaling
//!
//! Both reserves are lifted onto a 2^48 grid before solving.  Token A is
//! shifted left by [`SCALE_SHIFT`]; token B is multiplied by the rate
//! target, which already carries 48 fractional bits.  The result is brought
//! back by the inverse operation.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use tracing::debug;

use crate::domain::Target;
use crate::error::AmmError;

/// Number of Newton steps per trade.
pub const NEWTON_ROUNDS: u32 = 5;

/// Fixed-point shift applied to token A quantities.
pub const SCALE_SHIFT: u32 = 48;

/// Evaluates the utility and its derivative with respect to `y`.
///
/// Returns `(U, dU/dy)` with `dU/dy = 8 * |(x - y)^7 + (x + y)^7|`.
#[must_use]
pub fn util(x: &BigInt, y: &BigInt) -> (BigInt, BigInt) {
    let plus = x + y;
    let minus = x - y;
    let u = (plus.pow(8) - minus.pow(8)).abs();
    let du_dy = (minus.pow(7) + plus.pow(7)).abs() * 8;
    (u, du_dy)
}

/// Runs `rounds` Newton steps and returns the solved `dy`.
///
/// # Errors
///
/// Returns [`AmmError::DivisionByZero`] if the derivative vanishes at any
/// step, which happens when `x + dx` is zero.
pub fn newton(
    x: &BigInt,
    y: &BigInt,
    dx: &BigInt,
    u_target: &BigInt,
    rounds: u32,
) -> Result<BigInt, AmmError> {
    let x_after = x + dx;
    let mut dy = BigInt::zero();
    for _ in 0..rounds {
        let (u, du_dy) = util(&x_after, &(y - &dy).abs());
        if du_dy.is_zero() {
            return Err(AmmError::DivisionByZero("utility derivative is zero"));
        }
        dy += (u - u_target).abs() / du_dy;
    }
    Ok(dy)
}

/// Output of token B for selling `d_a` of token A.
///
/// `pool_a` and `pool_b` are the reserves, already multiplied by their
/// precision multipliers.  `target` is the price of one unit of B in A.
///
/// # Errors
///
/// - [`AmmError::DivisionByZero`] if the derivative vanishes.
/// - [`AmmError::Overflow`] if the result does not fit in `u128`.
pub fn trade_dx_to_dy(
    pool_a: u128,
    pool_b: u128,
    d_a: u128,
    target: Target,
    rounds: u32,
) -> Result<u128, AmmError> {
    let target = BigInt::from(target.bits());
    let x = BigInt::from(pool_a) << SCALE_SHIFT;
    let y = &target * BigInt::from(pool_b);
    let dx = BigInt::from(d_a) << SCALE_SHIFT;
    let (u, _) = util(&x, &y);
    let dy = newton(&x, &y, &dx, &u, rounds)?;
    let out = dy / target;
    debug!(pool_a, pool_b, d_a, %out, "flat curve A -> B");
    out.to_u128().ok_or(AmmError::Overflow("flat curve output"))
}

/// Output of token A for selling `d_b` of token B.
///
/// Mirror of [`trade_dx_to_dy`]: token B becomes the `x` side.
///
/// # Errors
///
/// - [`AmmError::DivisionByZero`] if the derivative vanishes.
/// - [`AmmError::Overflow`] if the result does not fit in `u128`.
pub fn trade_dy_to_dx(
    pool_a: u128,
    pool_b: u128,
    d_b: u128,
    target: Target,
    rounds: u32,
) -> Result<u128, AmmError> {
    let target = BigInt::from(target.bits());
    let x = &target * BigInt::from(pool_b);
    let y = BigInt::from(pool_a) << SCALE_SHIFT;
    let dx = &target * BigInt::from(d_b);
    let (u, _) = util(&x, &y);
    let dy = newton(&x, &y, &dx, &u, rounds)?;
    let out: BigInt = dy >> SCALE_SHIFT;
    debug!(pool_a, pool_b, d_b, %out, "flat curve B -> A");
    out.to_u128().ok_or(AmmError::Overflow("flat curve output"))
}
