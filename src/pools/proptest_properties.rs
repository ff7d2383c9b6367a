//! Property-based tests for the pool invariants.
//!
//! 1. **Conservation**: a deposit or withdrawal moves the reserve ratio by
//!    less than one unit of rounding.
//! 2. **Share monotonicity**: deposits strictly grow the share supply,
//!    withdrawals shrink it by exactly the burned amount.
//! 3. **Bootstrap anchor**: the first deposit mints `isqrt(a * b) - 1000`.
//! 4. **Fee monotonicity**: a swap pays strictly less than the fee-less
//!    constant-product output.
//! 5. **Flat curve at parity**: the solver never returns more than it
//!    receives.

use proptest::prelude::*;

use super::liquidity::{bootstrap_shares, INITIAL_LIQUIDITY_OFFSET};
use super::test_support::{addr, at, funded_ledger, pair, Fixture};
use super::VolatilePool;
use crate::config::VolatilePoolConfig;
use crate::domain::{Amount, CallContext, Deposit, FeeDivisor, Shares, Target, Withdrawal};
use crate::math::constant_product::{quote_exact_in, CurveFees};
use crate::math::flat_curve::{trade_dx_to_dy, NEWTON_ROUNDS};
use crate::math::{isqrt, mul_div};
use crate::token::InMemoryLedger;
use crate::traits::{FromConfig, LiquidityPool, TokenLedger};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

const POOL: u8 = 1;
const LP: u8 = 2;
const ALICE: u8 = 20;

#[derive(Debug, Clone, Copy)]
enum LiquidityStep {
    Add { max_a: u128, max_b: u128 },
    Remove { permille: u128 },
}

fn seeded_pool(a: u128, b: u128) -> (VolatilePool, InMemoryLedger) {
    let Ok(cfg) = VolatilePoolConfig::new(addr(POOL), addr(LP), addr(9), pair(6, 6)) else {
        panic!("valid config");
    };
    let Ok(mut pool) = VolatilePool::from_config(&cfg) else {
        panic!("valid pool");
    };
    let mut ledger = funded_ledger(&Fixture {
        pool: addr(POOL),
        share_token: addr(LP),
        pair: pair(6, 6),
        holders: &[addr(ALICE)],
        balance: 1_000_000_000_000_000,
    });
    let seed = Deposit {
        max_a: Amount::new(a),
        max_b: Amount::new(b),
        min_shares: Shares::ZERO,
        recipient: addr(ALICE),
    };
    let Ok(_) = pool.add_liquidity(&CallContext::new(addr(ALICE), at(1)), &mut ledger, seed) else {
        panic!("bootstrap");
    };
    (pool, ledger)
}

fn reserve_strategy() -> impl Strategy<Value = u128> {
    1_000_000u128..=1_000_000_000_000u128
}

fn step_strategy() -> impl Strategy<Value = LiquidityStep> {
    prop_oneof![
        (1u128..=10_000_000_000u128, 1u128..=10_000_000_000u128)
            .prop_map(|(max_a, max_b)| LiquidityStep::Add { max_a, max_b }),
        (1u128..=999u128).prop_map(|permille| LiquidityStep::Remove { permille }),
    ]
}

fn default_fees() -> CurveFees {
    let (Ok(lp_fee), Ok(system_fee)) = (FeeDivisor::new(500), FeeDivisor::new(1_000)) else {
        panic!("valid divisors");
    };
    CurveFees {
        lp_fee,
        system_fee,
        max_swap_limit: 40,
    }
}

/// `|a' * b - b' * a|`, the cross-product drift of a ratio change.
fn ratio_drift(before: (Amount, Amount), after: (Amount, Amount)) -> u128 {
    let lhs = after.0.get() * before.1.get();
    let rhs = after.1.get() * before.0.get();
    lhs.abs_diff(rhs)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn liquidity_steps_conserve_ratio_and_move_shares(
        a in reserve_strategy(),
        b in reserve_strategy(),
        steps in prop::collection::vec(step_strategy(), 1..8),
    ) {
        let (mut pool, mut ledger) = seeded_pool(a, b);
        for (i, step) in steps.into_iter().enumerate() {
            let ctx = CallContext::new(addr(ALICE), at(2 + i as u64));
            let before = pool.clone();
            let reserves = pool.reserves();
            let supply = pool.total_shares();
            match step {
                LiquidityStep::Add { max_a, max_b } => {
                    let d = Deposit {
                        max_a: Amount::new(max_a),
                        max_b: Amount::new(max_b),
                        min_shares: Shares::ZERO,
                        recipient: addr(ALICE),
                    };
                    match pool.add_liquidity(&ctx, &mut ledger, d) {
                        Ok(minted) => {
                            prop_assert!(!minted.is_zero());
                            prop_assert_eq!(pool.total_shares().get(), supply.get() + minted.get());
                        }
                        Err(_) => prop_assert_eq!(&pool, &before),
                    }
                }
                LiquidityStep::Remove { permille } => {
                    let Ok(held) = ledger.balance_of(addr(LP), addr(ALICE)) else {
                        panic!("share token registered");
                    };
                    let w = Withdrawal {
                        shares: Shares::new(held.get() * permille / 1_000),
                        min_a: Amount::ZERO,
                        min_b: Amount::ZERO,
                        recipient: addr(ALICE),
                    };
                    match pool.remove_liquidity(&ctx, &mut ledger, w) {
                        Ok(_) => {
                            prop_assert_eq!(pool.total_shares().get(), supply.get() - w.shares.get());
                        }
                        Err(_) => prop_assert_eq!(&pool, &before),
                    }
                }
            }
            let tolerance = reserves.0.get().max(reserves.1.get());
            prop_assert!(ratio_drift(reserves, pool.reserves()) < tolerance);
        }
    }

    #[test]
    fn bootstrap_mints_root_minus_offset(a in 1u128..=1_000_000_000u128, b in 1u128..=1_000_000_000u128) {
        let root = isqrt(a * b);
        match bootstrap_shares(Amount::new(a), Amount::new(b)) {
            Ok(shares) => {
                prop_assert!(root > INITIAL_LIQUIDITY_OFFSET);
                prop_assert_eq!(shares.get(), root - INITIAL_LIQUIDITY_OFFSET);
            }
            Err(_) => prop_assert!(root <= INITIAL_LIQUIDITY_OFFSET),
        }
    }

    #[test]
    fn swap_output_below_fee_less_output(
        reserve in reserve_strategy(),
        skew in 1u128..=4u128,
        fraction in 0.0f64..1.0f64,
    ) {
        let reserve_out = reserve * skew;
        let max_in = reserve / 100;
        let amount_in = 2_000 + ((max_in - 2_000) as f64 * fraction) as u128;
        let Ok(quote) = quote_exact_in(
            Amount::new(reserve),
            Amount::new(reserve_out),
            Amount::new(amount_in),
            default_fees(),
        ) else {
            panic!("in-range swap");
        };
        let Ok(fee_less) = mul_div(amount_in, reserve_out, reserve + amount_in) else {
            panic!("fee-less output");
        };
        prop_assert!(quote.amount_out.get() < fee_less);
        prop_assert!(quote.system_fee.get() > 0);
    }

    #[test]
    fn flat_curve_never_pays_more_than_received_at_parity(
        reserve in reserve_strategy(),
        fraction in 1u128..=100u128,
    ) {
        let amount_in = reserve * fraction / 1_000;
        let Ok(out) = trade_dx_to_dy(reserve, reserve, amount_in, Target::PARITY, NEWTON_ROUNDS) else {
            panic!("solver");
        };
        prop_assert!(out <= amount_in);
        prop_assert!(out > 0);
    }
}
