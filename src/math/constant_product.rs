//! Constant-product (`x * y = k`) swap solver with reciprocal fees.
//!
//! # Swap Algorithm (sell `amount_in` of the input asset)
//!
//! 1. `lp_fee = amount_in / lp_fee_divisor`
//! 2. `system_fee = amount_in / system_fee_divisor`, which must be non-zero
//! 3. `new_reserve_out = reserve_in * reserve_out / (reserve_in + amount_in - lp_fee - system_fee)`
//! 4. `amount_out = reserve_out - new_reserve_out`
//! 5. `new_reserve_in = reserve_in + amount_in - system_fee`
//!
//! The LP fee stays in the pool and grows `k`; the system fee leaves the
//! reserves for the protocol accumulator.  Every division floors.

use tracing::debug;

use super::mul_div;
use crate::domain::{Amount, FeeDivisor};
use crate::error::AmmError;

/// Fee and size parameters for one quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveFees {
    /// Divisor of the fee left to liquidity providers.
    pub lp_fee: FeeDivisor,
    /// Divisor of the fee set aside for the protocol.
    pub system_fee: FeeDivisor,
    /// Largest trade as a percentage of the input reserve.
    pub max_swap_limit: u8,
}

/// A priced trade, not yet applied to any pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveQuote {
    /// Amount the trader receives.
    pub amount_out: Amount,
    /// Fee kept by liquidity providers.
    pub lp_fee: Amount,
    /// Fee routed to the protocol accumulator.
    pub system_fee: Amount,
    /// Input reserve after the trade.
    pub new_reserve_in: Amount,
    /// Output reserve after the trade.
    pub new_reserve_out: Amount,
}

/// Prices selling `amount_in` against `(reserve_in, reserve_out)`.
///
/// # Errors
///
/// - [`AmmError::InsufficientAmount`] if `amount_in` is zero, the system fee
///   rounds to zero, or the output rounds to zero.
/// - [`AmmError::InvalidState`] if either reserve is empty.
/// - [`AmmError::SwapLimitExceeded`] if
///   `amount_in * 100 > reserve_in * max_swap_limit`.
/// - [`AmmError::Overflow`] / [`AmmError::Underflow`] on arithmetic failure.
pub fn quote_exact_in(
    reserve_in: Amount,
    reserve_out: Amount,
    amount_in: Amount,
    fees: CurveFees,
) -> Result<CurveQuote, AmmError> {
    if amount_in.is_zero() {
        return Err(AmmError::InsufficientAmount("swap amount must be positive"));
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(AmmError::InvalidState("pool has no liquidity"));
    }

    let scaled_in = amount_in
        .get()
        .checked_mul(100)
        .ok_or(AmmError::Overflow("swap size check"))?;
    let cap = reserve_in
        .get()
        .checked_mul(u128::from(fees.max_swap_limit))
        .ok_or(AmmError::Overflow("swap size cap"))?;
    if scaled_in > cap {
        return Err(AmmError::SwapLimitExceeded);
    }

    let lp_fee = fees.lp_fee.apply(amount_in);
    let system_fee = fees.system_fee.apply(amount_in);
    if system_fee.is_zero() {
        return Err(AmmError::InsufficientAmount(
            "trade too small to pay the system fee",
        ));
    }

    let effective_in = reserve_in
        .checked_add(&amount_in)
        .and_then(|v| v.checked_sub(&lp_fee))
        .and_then(|v| v.checked_sub(&system_fee))
        .ok_or(AmmError::Overflow("effective input reserve"))?;

    let new_reserve_out = Amount::new(mul_div(
        reserve_in.get(),
        reserve_out.get(),
        effective_in.get(),
    )?);
    let amount_out = reserve_out
        .checked_sub(&new_reserve_out)
        .ok_or(AmmError::Underflow("output reserve"))?;
    if amount_out.is_zero() {
        return Err(AmmError::InsufficientAmount("trade yields no output"));
    }

    let new_reserve_in = reserve_in
        .checked_add(&amount_in)
        .and_then(|v| v.checked_sub(&system_fee))
        .ok_or(AmmError::Overflow("input reserve"))?;

    debug!(
        %amount_in, %amount_out, %lp_fee, %system_fee,
        "constant product quote"
    );

    Ok(CurveQuote {
        amount_out,
        lp_fee,
        system_fee,
        new_reserve_in,
        new_reserve_out,
    })
}
