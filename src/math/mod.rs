//! Arithmetic for pools, staking and the vault.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`CheckedArithmetic`] | `?`-friendly checked ops on [`Amount`](crate::domain::Amount) and [`Shares`](crate::domain::Shares) |
//! | [`mul_div`], [`sqrt_product`] | wide intermediates for reserve products |
//! | [`flat_curve`] | Newton solver for stable pools |
//! | [`constant_product`] | `x * y = k` solver for volatile pools |
//! | `target_from_fixed` / `target_to_fixed` | `I80F48` interop (`fixed-point` feature) |

mod checked;
pub mod constant_product;
pub mod flat_curve;
mod wide;

#[cfg(feature = "fixed-point")]
mod fixed_precision;

pub use checked::CheckedArithmetic;
pub use wide::{isqrt, mul_div, sqrt_product};

#[cfg(feature = "fixed-point")]
pub use fixed_precision::{target_from_fixed, target_to_fixed};
