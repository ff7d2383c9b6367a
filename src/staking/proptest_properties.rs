//! Property-based tests for the reward engine.
//!
//! 1. **Reward non-negativity**: the stored index never decreases.
//! 2. **Supply consistency**: the scaled total stake equals the sum of the
//!    stakers' balances and of their open lots.
//! 3. **Bounded payout**: claimed rewards never exceed what was emitted.

use proptest::prelude::*;

use super::{StakingPool, MULTIPLIER};
use crate::config::StakingConfig;
use crate::domain::{Address, Amount, BlockHeight, CallContext, Decimals, Token};
use crate::token::InMemoryLedger;
use crate::traits::{FromConfig, LedgerOp, TokenLedger};

const CONTRACT: u8 = 1;
const ADMIN: u8 = 2;
const STAKE: u8 = 10;
const REWARD: u8 = 11;
const ISSUER: u8 = 250;
const STAKERS: [u8; 3] = [20, 21, 22];
const REWARD_FUNDING: u128 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy)]
enum Action {
    Stake { who: usize, amount: u128 },
    Unstake { who: usize, amount: u128 },
    Claim { who: usize },
    AddReward { reward: u128, blocks: u64 },
}

fn addr(byte: u8) -> Address {
    Address::from_bytes([byte; 32])
}

fn setup() -> (StakingPool, InMemoryLedger) {
    let Ok(cfg) = StakingConfig::new(addr(CONTRACT), addr(ADMIN), addr(STAKE), addr(REWARD)) else {
        panic!("valid config");
    };
    let Ok(pool) = StakingPool::from_config(&cfg) else {
        panic!("pool");
    };
    let mut ledger = InMemoryLedger::new();
    for t in [STAKE, REWARD] {
        let Ok(()) = ledger.create_token(Token::new(addr(t), Decimals::MAX), addr(ISSUER)) else {
            panic!("token");
        };
    }
    let mut mints: Vec<LedgerOp> = STAKERS
        .iter()
        .map(|&s| LedgerOp::Mint {
            token: addr(STAKE),
            to: addr(s),
            amount: Amount::new(1_000_000_000),
        })
        .collect();
    mints.push(LedgerOp::Mint {
        token: addr(REWARD),
        to: addr(CONTRACT),
        amount: Amount::new(REWARD_FUNDING),
    });
    let Ok(()) = ledger.execute(addr(ISSUER), &mints, BlockHeight::ZERO) else {
        panic!("funding");
    };
    for s in STAKERS {
        let ctx = CallContext::new(addr(s), BlockHeight::ZERO);
        let Ok(()) = ledger.approve(&ctx, addr(STAKE), addr(CONTRACT), Amount::MAX) else {
            panic!("approve");
        };
    }
    (pool, ledger)
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0..STAKERS.len(), 1u128..=1_000_000u128)
            .prop_map(|(who, amount)| Action::Stake { who, amount }),
        2 => (0..STAKERS.len(), 1u128..=1_000_000u128)
            .prop_map(|(who, amount)| Action::Unstake { who, amount }),
        2 => (0..STAKERS.len()).prop_map(|who| Action::Claim { who }),
        1 => (0u128..=1_000_000u128, 1u64..=500u64)
            .prop_map(|(reward, blocks)| Action::AddReward { reward, blocks }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn index_and_supply_stay_consistent(
        actions in prop::collection::vec((action_strategy(), 0u64..=50u64), 1..40),
    ) {
        let (mut pool, mut ledger) = setup();
        let Ok(()) = pool.add_reward(
            &CallContext::new(addr(ADMIN), BlockHeight::new(1)),
            Amount::new(100_000),
            1_000,
        ) else {
            panic!("first period");
        };
        let mut block = 1u64;
        let mut added: u128 = 100_000;
        let mut claimed: u128 = 0;

        for (action, gap) in actions {
            block += gap;
            let index_before = pool.reward_per_token_stored();
            match action {
                Action::Stake { who, amount } => {
                    let ctx = CallContext::new(addr(STAKERS[who]), BlockHeight::new(block));
                    let _ = pool.stake(&ctx, &mut ledger, Amount::new(amount));
                }
                Action::Unstake { who, amount } => {
                    let owner = addr(STAKERS[who]);
                    let ctx = CallContext::new(owner, BlockHeight::new(block));
                    if let Some((id, lot)) = pool.lots(owner).first().copied() {
                        let take = amount.min(lot.amount.get());
                        prop_assert!(pool.unstake(&ctx, &mut ledger, id, Amount::new(take)).is_ok());
                    }
                }
                Action::Claim { who } => {
                    let ctx = CallContext::new(addr(STAKERS[who]), BlockHeight::new(block));
                    if let Ok(paid) = pool.get_reward(&ctx, &mut ledger) {
                        claimed += paid.get();
                    }
                }
                Action::AddReward { reward, blocks } => {
                    let ctx = CallContext::new(addr(ADMIN), BlockHeight::new(block));
                    prop_assert!(pool.add_reward(&ctx, Amount::new(reward), blocks).is_ok());
                    added += reward;
                }
            }
            prop_assert!(pool.reward_per_token_stored() >= index_before);

            let mut balances = 0u128;
            let mut lots = 0u128;
            for s in STAKERS {
                balances += pool.balance_of(addr(s));
                lots += pool.lots(addr(s)).iter().map(|(_, l)| l.amount.get()).sum::<u128>();
            }
            prop_assert_eq!(pool.total_supply(), balances);
            prop_assert_eq!(balances, lots * MULTIPLIER);
            prop_assert!(claimed <= added);
        }
    }
}
