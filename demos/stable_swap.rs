//! Stable pool walkthrough with an off-pool rate oracle.
//!
//! A swap is requested, the oracle answers with the current target, and
//! the pool settles.  A second request shows the lock and cancellation.
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=tidepool=debug cargo run --example stable_swap
//! ```

use tidepool::config::StableSwapConfig;
use tidepool::domain::{
    Address, Amount, BlockHeight, CallContext, Decimals, Deposit, Shares, SwapOrder, Target, Token,
    TokenPair,
};
use tidepool::error::AmmError;
use tidepool::pools::StableSwapPool;
use tidepool::token::InMemoryLedger;
use tidepool::traits::{FromConfig, LedgerOp, LiquidityPool, TokenLedger};
use tracing_subscriber::EnvFilter;

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 32])
}

fn at(sender: Address, block: u64) -> CallContext {
    CallContext::new(sender, BlockHeight::new(block))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Stable Pool (flat curve, oracle target) ===\n");

    // ── 1. A 6-decimal stablecoin against an 18-decimal staked derivative ─
    let (pool_addr, lp_token, admin, oracle, issuer) = (addr(1), addr(2), addr(3), addr(4), addr(5));
    let trader = addr(20);
    let stable = Token::new(addr(10), Decimals::new(6)?);
    let derivative = Token::new(addr(11), Decimals::new(18)?);

    let mut ledger = InMemoryLedger::new();
    ledger.create_token(stable, issuer)?;
    ledger.create_token(derivative, issuer)?;
    ledger.create_token(Token::new(lp_token, Decimals::new(18)?), pool_addr)?;
    let funding = [
        LedgerOp::Mint { token: stable.address(), to: trader, amount: Amount::new(10_000_000_000) },
        LedgerOp::Mint {
            token: derivative.address(),
            to: trader,
            amount: Amount::new(10_000_000_000_000_000_000_000),
        },
    ];
    ledger.execute(issuer, &funding, BlockHeight::ZERO)?;
    ledger.approve(&at(trader, 0), stable.address(), pool_addr, Amount::MAX)?;
    ledger.approve(&at(trader, 0), derivative.address(), pool_addr, Amount::MAX)?;

    let config = StableSwapConfig::new(pool_addr, lp_token, admin, oracle, TokenPair::new(stable, derivative)?)?;
    let mut pool = StableSwapPool::from_config(&config)?;
    println!("Precision multipliers: {:?}", pool.precision_multipliers());

    // ── 2. Seed with equal value on both sides ──────────────────────────
    let seed = Deposit {
        max_a: Amount::new(1_000_000_000),
        max_b: Amount::new(1_000_000_000_000_000_000_000),
        min_shares: Shares::new(1),
        recipient: trader,
    };
    let minted = pool.add_liquidity(&at(trader, 1), &mut ledger, seed)?;
    println!("Seeded 1 000 of each asset, minted {minted} shares\n");

    // ── 3. Request, answer, settle ──────────────────────────────────────
    let order = SwapOrder {
        amount_in: Amount::new(50_000_000),
        min_out: Amount::new(1),
        token_out: derivative.address(),
        recipient: trader,
    };
    let query = pool.request_swap(&at(trader, 2), order)?;
    println!("Swap parked as {}; asking oracle {}", query.request_id, query.oracle);

    match pool.request_swap(&at(trader, 2), order) {
        Err(AmmError::Locked(reason)) => println!("Second request refused: {reason}"),
        other => println!("Unexpected: {other:?}"),
    }

    // 1 derivative unit is worth 1.05 stable units
    let target = Target::from_ratio(105, 100)?;
    let result = pool.settle_swap(&at(oracle, 3), &mut ledger, query.answer(oracle, target))?;
    println!(
        "Settled at target {target}: {} in, {} out, {} fee kept by LPs",
        result.amount_in(),
        result.amount_out(),
        result.lp_fee()
    );
    let (ra, rb) = pool.reserves();
    println!("Reserves now: A = {ra}, B = {rb}\n");

    // ── 4. An unanswered request can be withdrawn ───────────────────────
    let query = pool.request_swap(&at(trader, 4), order)?;
    let cancelled = pool.cancel_swap(&at(trader, 5))?;
    println!(
        "Cancelled {} for {} of input; pool unlocked: {}",
        query.request_id,
        cancelled.order.amount_in,
        pool.pending_swap(BlockHeight::new(5)).is_none()
    );

    Ok(())
}
