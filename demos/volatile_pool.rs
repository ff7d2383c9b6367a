//! Volatile (constant-product) pool walkthrough.
//!
//! Seeds a pool, trades both directions, adds and removes liquidity and
//! collects the system fee.
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=tidepool=debug cargo run --example volatile_pool
//! ```

use tidepool::config::VolatilePoolConfig;
use tidepool::domain::{
    Address, Amount, BlockHeight, CallContext, Decimals, Deposit, FeeDivisor, Shares, SwapOrder,
    Token, TokenPair, Withdrawal,
};
use tidepool::pools::VolatilePool;
use tidepool::token::InMemoryLedger;
use tidepool::traits::{FromConfig, LedgerOp, LiquidityPool, TokenLedger};
use tracing_subscriber::EnvFilter;

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 32])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Volatile Pool (x * y = k) ===\n");

    // ── 1. Tokens and ledger ────────────────────────────────────────────
    let (pool_addr, lp_token, admin, issuer) = (addr(1), addr(2), addr(3), addr(4));
    let (alice, bob) = (addr(20), addr(21));
    let usdc = Token::new(addr(10), Decimals::new(6)?);
    let dai = Token::new(addr(11), Decimals::new(6)?);

    let mut ledger = InMemoryLedger::new();
    ledger.create_token(usdc, issuer)?;
    ledger.create_token(dai, issuer)?;
    ledger.create_token(Token::new(lp_token, Decimals::new(6)?), pool_addr)?;
    for who in [alice, bob] {
        let funding = [
            LedgerOp::Mint { token: usdc.address(), to: who, amount: Amount::new(50_000_000) },
            LedgerOp::Mint { token: dai.address(), to: who, amount: Amount::new(50_000_000) },
        ];
        ledger.execute(issuer, &funding, BlockHeight::ZERO)?;
        let ctx = CallContext::new(who, BlockHeight::ZERO);
        ledger.approve(&ctx, usdc.address(), pool_addr, Amount::MAX)?;
        ledger.approve(&ctx, dai.address(), pool_addr, Amount::MAX)?;
    }

    // ── 2. Pool with 0.2% LP fee and 0.1% system fee ────────────────────
    let config = VolatilePoolConfig::new(pool_addr, lp_token, admin, TokenPair::new(usdc, dai)?)?
        .with_fees(FeeDivisor::new(500)?, FeeDivisor::new(1_000)?)?;
    let mut pool = VolatilePool::from_config(&config)?;

    let seed = Deposit {
        max_a: Amount::new(10_000_000),
        max_b: Amount::new(10_000_000),
        min_shares: Shares::new(1),
        recipient: alice,
    };
    let minted = pool.add_liquidity(&CallContext::new(alice, BlockHeight::new(1)), &mut ledger, seed)?;
    println!("Alice seeded the pool and received {minted} shares");
    println!("Total shares (incl. locked offset): {}\n", pool.total_shares());

    // ── 3. Trades ───────────────────────────────────────────────────────
    for (block, amount_in, token_out) in [(2, 100_000, dai.address()), (3, 250_000, usdc.address())] {
        let order = SwapOrder {
            amount_in: Amount::new(amount_in),
            min_out: Amount::new(1),
            token_out,
            recipient: bob,
        };
        let result = pool.swap(&CallContext::new(bob, BlockHeight::new(block)), &mut ledger, order)?;
        println!(
            "Bob sold {} (side {:?}) for {}: lp fee {}, system fee {}",
            result.amount_in(),
            result.side_in(),
            result.amount_out(),
            result.lp_fee(),
            result.system_fee()
        );
    }
    let (ra, rb) = pool.reserves();
    println!("Reserves now: A = {ra}, B = {rb}\n");

    // ── 4. Liquidity in and out ─────────────────────────────────────────
    let top_up = Deposit {
        max_a: Amount::new(1_000_000),
        max_b: Amount::new(1_000_000),
        min_shares: Shares::new(1),
        recipient: bob,
    };
    let bob_shares = pool.add_liquidity(&CallContext::new(bob, BlockHeight::new(4)), &mut ledger, top_up)?;
    println!("Bob added liquidity at the current ratio for {bob_shares} shares");

    let exit = Withdrawal {
        shares: bob_shares,
        min_a: Amount::ZERO,
        min_b: Amount::ZERO,
        recipient: bob,
    };
    let (out_a, out_b) = pool.remove_liquidity(&CallContext::new(bob, BlockHeight::new(5)), &mut ledger, exit)?;
    println!("Bob withdrew A = {out_a}, B = {out_b}\n");

    // ── 5. System fee collection ────────────────────────────────────────
    let (fee_a, fee_b) = pool.system_fee_accumulators();
    println!("Accrued system fees: A = {fee_a}, B = {fee_b}");
    pool.withdraw_system_fees(&CallContext::new(admin, BlockHeight::new(6)), &mut ledger, admin)?;
    println!(
        "Admin balances after withdrawal: A = {}, B = {}",
        ledger.balance_of(usdc.address(), admin)?,
        ledger.balance_of(dai.address(), admin)?
    );

    Ok(())
}
