//! Staking walkthrough: a reward period, two stakers, claims and exit fees.
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=tidepool=debug cargo run --example staking_rewards
//! ```

use tidepool::config::StakingConfig;
use tidepool::domain::{Address, Amount, BlockHeight, CallContext, Decimals, Token};
use tidepool::staking::StakingPool;
use tidepool::token::InMemoryLedger;
use tidepool::traits::{FromConfig, LedgerOp, TokenLedger};
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

    println!("=== Staking Rewards ===\n");

    let (contract, admin, issuer) = (addr(1), addr(2), addr(3));
    let (alice, bob) = (addr(20), addr(21));
    let stake_token = Token::new(addr(10), Decimals::new(18)?);
    let reward_token = Token::new(addr(11), Decimals::new(18)?);

    let mut ledger = InMemoryLedger::new();
    ledger.create_token(stake_token, issuer)?;
    ledger.create_token(reward_token, issuer)?;
    let funding = [
        LedgerOp::Mint { token: stake_token.address(), to: alice, amount: Amount::new(1_000_000) },
        LedgerOp::Mint { token: stake_token.address(), to: bob, amount: Amount::new(1_000_000) },
        LedgerOp::Mint { token: reward_token.address(), to: contract, amount: Amount::new(10_000_000) },
    ];
    ledger.execute(issuer, &funding, BlockHeight::ZERO)?;
    for who in [alice, bob] {
        ledger.approve(&at(who, 0), stake_token.address(), contract, Amount::MAX)?;
    }

    // ── 1. Standard exit fees: 1/4, 1/8, 1/10, then 1/25 ───────────────
    let config = StakingConfig::new(contract, admin, stake_token.address(), reward_token.address())?;
    let mut staking = StakingPool::from_config(&config)?;
    let blocks_per_cycle = staking.fee_schedule().blocks_per_cycle();
    println!("Blocks per fee cycle: {blocks_per_cycle}");

    // ── 2. 1 000 000 reward tokens over 100 000 blocks ───────────────────
    staking.add_reward(&at(admin, 0), Amount::new(1_000_000), 100_000)?;
    println!("Reward rate: {} per block\n", staking.reward_rate());

    // ── 3. Alice stakes first, Bob joins later with three times as much ─
    let alice_lot = staking.stake(&at(alice, 0), &mut ledger, Amount::new(10_000))?;
    let bob_lot = staking.stake(&at(bob, 1_000), &mut ledger, Amount::new(30_000))?;

    for block in [1_000, 2_000, 5_000] {
        let now = BlockHeight::new(block);
        println!(
            "Block {block}: Alice earned {}, Bob earned {}",
            staking.earned(alice, now)?,
            staking.earned(bob, now)?
        );
    }

    let claimed = staking.get_reward(&at(alice, 5_000), &mut ledger)?;
    println!("\nAlice claimed {claimed}");

    // ── 4. Exits in different fee cycles ─────────────────────────────────
    let early = staking.unstake(&at(bob, 5_000 + blocks_per_cycle), &mut ledger, bob_lot, Amount::new(30_000))?;
    println!(
        "Bob left in cycle {}: paid out {}, fee {}",
        early.cycle, early.payout, early.fee
    );
    let late = staking.unstake(
        &at(alice, 5 * blocks_per_cycle),
        &mut ledger,
        alice_lot,
        Amount::new(10_000),
    )?;
    println!(
        "Alice left in cycle {}: paid out {}, fee {}",
        late.cycle, late.payout, late.fee
    );

    // ── 5. Admin sweeps the collected fees ───────────────────────────────
    let fees = staking.total_fee();
    staking.withdraw_fees(&at(admin, 5 * blocks_per_cycle), &mut ledger, admin)?;
    println!(
        "\nCollected exit fees: {fees}; admin now holds {}",
        ledger.balance_of(stake_token.address(), admin)?
    );

    Ok(())
}
