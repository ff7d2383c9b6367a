//! Narrow capabilities composed by the concrete components.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`TokenLedger`] | [`InMemoryLedger`](crate::token::InMemoryLedger) |
//! | [`Checkpointable`] | [`CheckpointedToken`](crate::token::CheckpointedToken) |
//! | [`Administrable`], [`Pausable`] | pools, staking pool, vault, reward manager |
//! | [`LiquidityPool`] | both two-asset pools |
//! | [`FromConfig`] | every configurable component |

mod access;
mod checkpointable;
mod from_config;
mod ledger;
mod liquidity_pool;

pub use access::{Administrable, Pausable};
pub use checkpointable::Checkpointable;
pub use from_config::FromConfig;
pub use ledger::{LedgerOp, TokenLedger};
pub use liquidity_pool::LiquidityPool;
