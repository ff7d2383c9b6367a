//! # Tidepool
//!
//! Integer-exact AMM pools, a staking reward engine and a single-sided
//! share vault, settled against a pluggable token ledger.
//!
//! The crate provides:
//!
//! - **Volatile pools** (`x * y = k` with LP and system fees), `constant-product` feature
//! - **Stable pools** (flat-curve Newton solver priced by an asynchronous
//!   oracle), `stable-swap` feature
//! - **Staking** (lazily settled reward index, lots with tiered exit fees), `staking` feature
//! - **Share vault** (backing balance read through an asynchronous query,
//!   rewards streamed in by a reward manager), `vault` feature
//! - **Checkpointed tokens** and an in-memory ledger that executes transfer
//!   batches atomically
//!
//! # Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `all` | yes | Enables every component |
//! | `constant-product` | yes | [`VolatilePool`](pools::VolatilePool) |
//! | `stable-swap` | yes | [`StableSwapPool`](pools::StableSwapPool) |
//! | `staking` | yes | [`StakingPool`](staking::StakingPool) |
//! | `vault` | yes | [`Vault`](vault::Vault) and [`RewardManager`](vault::RewardManager) |
//! | `fixed-point` | no | `I80F48` conversions for rate targets |
//! | `serde` | no | Serialisable configs and value types |
//!
//! # Quick Start
//!
//! ```rust
//! use tidepool::config::VolatilePoolConfig;
//! use tidepool::domain::{
//!     Address, Amount, BlockHeight, CallContext, Decimals, Deposit, Shares, SwapOrder, Token,
//!     TokenPair,
//! };
//! use tidepool::pools::VolatilePool;
//! use tidepool::token::InMemoryLedger;
//! use tidepool::traits::{FromConfig, LedgerOp, LiquidityPool, TokenLedger};
//!
//! # fn main() -> Result<(), tidepool::error::AmmError> {
//! let addr = |b: u8| Address::from_bytes([b; 32]);
//! let (pool_addr, lp_token, admin, issuer, alice) = (addr(1), addr(2), addr(3), addr(4), addr(5));
//! let usdc = Token::new(addr(10), Decimals::new(6)?);
//! let weth = Token::new(addr(11), Decimals::new(18)?);
//!
//! // 1. Tokens live in a ledger; the pool mints its own share token
//! let mut ledger = InMemoryLedger::new();
//! ledger.create_token(usdc, issuer)?;
//! ledger.create_token(weth, issuer)?;
//! ledger.create_token(Token::new(lp_token, Decimals::new(6)?), pool_addr)?;
//! let funding = [
//!     LedgerOp::Mint { token: usdc.address(), to: alice, amount: Amount::new(10_000_000) },
//!     LedgerOp::Mint { token: weth.address(), to: alice, amount: Amount::new(10_000_000) },
//! ];
//! ledger.execute(issuer, &funding, BlockHeight::ZERO)?;
//! let ctx = CallContext::new(alice, BlockHeight::new(1));
//! ledger.approve(&ctx, usdc.address(), pool_addr, Amount::MAX)?;
//! ledger.approve(&ctx, weth.address(), pool_addr, Amount::MAX)?;
//!
//! // 2. Build the pool from a validated config
//! let config = VolatilePoolConfig::new(pool_addr, lp_token, admin, TokenPair::new(usdc, weth)?)?;
//! let mut pool = VolatilePool::from_config(&config)?;
//!
//! // 3. Seed it and trade
//! let deposit = Deposit {
//!     max_a: Amount::new(1_000_000),
//!     max_b: Amount::new(1_000_000),
//!     min_shares: Shares::new(1),
//!     recipient: alice,
//! };
//! let minted = pool.add_liquidity(&ctx, &mut ledger, deposit)?;
//! assert_eq!(minted, Shares::new(999_000));
//!
//! let order = SwapOrder {
//!     amount_in: Amount::new(1_000),
//!     min_out: Amount::new(1),
//!     token_out: weth.address(),
//!     recipient: alice,
//! };
//! let result = pool.swap(&ctx, &mut ledger, order)?;
//! assert!(result.amount_out() < Amount::new(1_000));
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Callers    │  CallContext { sender, block }
//! └──────┬───────┘
//!        │ entrypoints (optionally through sync::Serialized)
//!        ▼
//! ┌──────────────┐      RateQuery / BalanceQuery      ┌───────────┐
//! │  Components  │ ─────────────────────────────────▶ │  Oracles  │
//! │ pools,       │ ◀───────────────────────────────── │  tokens   │
//! │ staking,     │      RateAnswer / BalanceAnswer    └───────────┘
//! │ vault        │
//! └──────┬───────┘
//!        │ LedgerOp batches (all or nothing)
//!        ▼
//! ┌──────────────┐
//! │ TokenLedger  │  InMemoryLedger of CheckpointedTokens
//! └──────────────┘
//! ```
//!
//! # Module Guide
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`domain`] | Newtype value types: [`Amount`](domain::Amount), [`Shares`](domain::Shares), [`Target`](domain::Target), etc. |
//! | [`traits`] | Capabilities: [`TokenLedger`](traits::TokenLedger), [`LiquidityPool`](traits::LiquidityPool), [`FromConfig`](traits::FromConfig) |
//! | [`config`] | Validated component configurations |
//! | [`math`]   | Checked arithmetic, wide products, curve solvers |
//! | [`pools`]  | Feature-gated pool implementations and shared liquidity accounting |
//! | [`staking`] | Reward index staking with lots |
//! | [`vault`]  | Share vault and reward manager |
//! | [`token`]  | Checkpointed token and in-memory ledger |
//! | [`callback`] | Two-phase request/answer plumbing |
//! | [`access`] | Admin and pause guard |
//! | [`sync`]   | Whole-operation serialisation for shared components |
//! | [`error`]  | [`AmmError`](error::AmmError) unified error enum |
//! | [`prelude`] | Convenience re-exports |

pub mod access;
pub mod callback;
pub mod config;
pub mod domain;
pub mod error;
pub mod math;
pub mod pools;
pub mod prelude;
pub mod sync;
pub mod token;
pub mod traits;

#[cfg(feature = "staking")]
pub mod staking;

#[cfg(feature = "vault")]
pub mod vault;
