//! Configuration for the staking reward engine.

use std::collections::BTreeMap;

use crate::domain::{Address, FeeDivisor};
use crate::error::AmmError;

/// Default blocks per unstake-fee cycle.
pub const DEFAULT_BLOCKS_PER_CYCLE: u64 = 4_096;

/// Default exit fee divisor once no tier applies (4%).
pub const DEFAULT_UNSTAKE_FEE_DIVISOR: u128 = 25;

/// Exit fee tiers by number of cycles a lot has been held.
///
/// A lot held for `n` cycles pays `amount / tiers[n]`, or
/// `amount / default` if `n` has no tier.  Cycle counting starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnstakeFeeSchedule {
    tiers: BTreeMap<u64, FeeDivisor>,
    default_fee: FeeDivisor,
    blocks_per_cycle: u64,
}

impl UnstakeFeeSchedule {
    /// Builds a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `blocks_per_cycle` is zero.
    pub fn new(
        tiers: BTreeMap<u64, FeeDivisor>,
        default_fee: FeeDivisor,
        blocks_per_cycle: u64,
    ) -> Result<Self, AmmError> {
        let schedule = Self {
            tiers,
            default_fee,
            blocks_per_cycle,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// The deployed defaults: `{1: 4, 2: 8, 3: 10}`, default 25, 4096 blocks.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in values.
    pub fn standard() -> Result<Self, AmmError> {
        let tiers = [(1, 4), (2, 8), (3, 10)]
            .into_iter()
            .map(|(cycle, d)| FeeDivisor::new(d).map(|f| (cycle, f)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Self::new(
            tiers,
            FeeDivisor::new(DEFAULT_UNSTAKE_FEE_DIVISOR)?,
            DEFAULT_BLOCKS_PER_CYCLE,
        )
    }

    /// Validates all invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `blocks_per_cycle` is zero.
    pub fn validate(&self) -> Result<(), AmmError> {
        if self.blocks_per_cycle == 0 {
            return Err(AmmError::InvalidConfiguration(
                "blocks per cycle must be positive",
            ));
        }
        Ok(())
    }

    /// Number of blocks in one cycle.
    #[must_use]
    pub const fn blocks_per_cycle(&self) -> u64 {
        self.blocks_per_cycle
    }

    /// Fee divisor applied when no tier matches.
    #[must_use]
    pub const fn default_fee(&self) -> FeeDivisor {
        self.default_fee
    }

    /// Explicit tiers.
    #[must_use]
    pub const fn tiers(&self) -> &BTreeMap<u64, FeeDivisor> {
        &self.tiers
    }

    /// Cycles elapsed for a lot held `blocks_held` blocks, counting from 1.
    #[must_use]
    pub const fn cycles(&self, blocks_held: u64) -> u64 {
        blocks_held / self.blocks_per_cycle + 1
    }

    /// Fee divisor for a lot in its `cycle`-th cycle.
    #[must_use]
    pub fn divisor_for(&self, cycle: u64) -> FeeDivisor {
        self.tiers.get(&cycle).copied().unwrap_or(self.default_fee)
    }

    /// Sets one tier and replaces the cycle length and default fee.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `blocks_per_cycle` is zero.
    pub fn update(
        &mut self,
        cycle: u64,
        divisor: FeeDivisor,
        blocks_per_cycle: u64,
        default_fee: FeeDivisor,
    ) -> Result<(), AmmError> {
        let mut next = self.clone();
        next.tiers.insert(cycle, divisor);
        next.blocks_per_cycle = blocks_per_cycle;
        next.default_fee = default_fee;
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Configuration for a [`StakingPool`](crate::staking::StakingPool).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StakingConfig {
    contract: Address,
    admin: Address,
    stake_token: Address,
    reward_token: Address,
    fee_schedule: UnstakeFeeSchedule,
}

impl StakingConfig {
    /// Creates a config with the standard exit fee schedule.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if validation fails.
    pub fn new(
        contract: Address,
        admin: Address,
        stake_token: Address,
        reward_token: Address,
    ) -> Result<Self, AmmError> {
        let config = Self {
            contract,
            admin,
            stake_token,
            reward_token,
            fee_schedule: UnstakeFeeSchedule::standard()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replaces the exit fee schedule.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if the schedule is invalid.
    pub fn with_fee_schedule(mut self, schedule: UnstakeFeeSchedule) -> Result<Self, AmmError> {
        self.fee_schedule = schedule;
        self.validate()?;
        Ok(self)
    }

    /// Validates all invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] on the first violation.
    pub fn validate(&self) -> Result<(), AmmError> {
        if self.contract == self.stake_token || self.contract == self.reward_token {
            return Err(AmmError::InvalidConfiguration(
                "staking contract cannot be a token address",
            ));
        }
        self.fee_schedule.validate()
    }

    /// Address of the staking contract.
    #[must_use]
    pub const fn contract(&self) -> Address {
        self.contract
    }

    /// Initial admin.
    #[must_use]
    pub const fn admin(&self) -> Address {
        self.admin
    }

    /// Token users stake.
    #[must_use]
    pub const fn stake_token(&self) -> Address {
        self.stake_token
    }

    /// Token rewards are paid in.
    #[must_use]
    pub const fn reward_token(&self) -> Address {
        self.reward_token
    }

    /// Exit fee schedule.
    #[must_use]
    pub const fn fee_schedule(&self) -> &UnstakeFeeSchedule {
        &self.fee_schedule
    }
}
