//! Fundamental domain value types.
//!
//! Amounts, shares, addresses, tokens, block heights and rate targets.
//! Every type is a newtype with a validated constructor where a raw value
//! could be invalid.

mod address;
mod amount;
mod block;
mod decimals;
mod fee;
mod order;
mod shares;
mod swap_result;
mod target;
mod token;
mod token_pair;

pub use address::Address;
pub use amount::Amount;
pub use block::{BlockHeight, CallContext};
pub use decimals::Decimals;
pub use fee::FeeDivisor;
pub use order::{Deposit, SwapOrder, Withdrawal};
pub use shares::Shares;
pub use swap_result::SwapResult;
pub use target::{Target, TARGET_FRACTIONAL_BITS};
pub use token::Token;
pub use token_pair::{Side, TokenPair};
