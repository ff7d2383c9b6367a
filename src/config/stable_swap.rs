//! Configuration for flat-curve (stable asset) pools.

use super::validate_fee_divisor;
use crate::domain::{Address, FeeDivisor, TokenPair};
use crate::error::AmmError;
use crate::math::flat_curve::NEWTON_ROUNDS;

/// Default LP fee divisor (0.1%).
pub const DEFAULT_STABLE_FEE_DIVISOR: u128 = 1_000;

/// Default number of blocks an oracle answer may take.
pub const DEFAULT_ANSWER_TIMEOUT: u64 = 100;

/// Configuration for a [`StableSwapPool`](crate::pools::StableSwapPool).
///
/// The precision multipliers are derived from the two tokens' decimals so
/// that both reserves are compared on the scale of the more precise token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StableSwapConfig {
    pool_address: Address,
    share_token: Address,
    admin: Address,
    oracle: Address,
    token_pair: TokenPair,
    lp_fee: FeeDivisor,
    newton_rounds: u32,
    answer_timeout: u64,
}

impl StableSwapConfig {
    /// Creates a config with the default fee, step count and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if validation fails.
    pub fn new(
        pool_address: Address,
        share_token: Address,
        admin: Address,
        oracle: Address,
        token_pair: TokenPair,
    ) -> Result<Self, AmmError> {
        let config = Self {
            pool_address,
            share_token,
            admin,
            oracle,
            token_pair,
            lp_fee: FeeDivisor::new(DEFAULT_STABLE_FEE_DIVISOR)?,
            newton_rounds: NEWTON_ROUNDS,
            answer_timeout: DEFAULT_ANSWER_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replaces the LP fee divisor.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if the divisor is too small.
    pub fn with_lp_fee(mut self, lp_fee: FeeDivisor) -> Result<Self, AmmError> {
        self.lp_fee = lp_fee;
        self.validate()?;
        Ok(self)
    }

    /// Replaces the oracle answer timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if `blocks` is zero.
    pub fn with_answer_timeout(mut self, blocks: u64) -> Result<Self, AmmError> {
        self.answer_timeout = blocks;
        self.validate()?;
        Ok(self)
    }

    /// Validates all invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] on the first violation.
    pub fn validate(&self) -> Result<(), AmmError> {
        if self.token_pair.side_of(self.share_token).is_some() {
            return Err(AmmError::InvalidConfiguration(
                "share token must differ from the pool assets",
            ));
        }
        validate_fee_divisor(self.lp_fee)?;
        if self.newton_rounds == 0 {
            return Err(AmmError::InvalidConfiguration("newton rounds must be positive"));
        }
        if self.answer_timeout == 0 {
            return Err(AmmError::InvalidConfiguration("answer timeout must be positive"));
        }
        Ok(())
    }

    /// Address of the pool.
    #[must_use]
    pub const fn pool_address(&self) -> Address {
        self.pool_address
    }

    /// Address of the share token.
    #[must_use]
    pub const fn share_token(&self) -> Address {
        self.share_token
    }

    /// Initial admin.
    #[must_use]
    pub const fn admin(&self) -> Address {
        self.admin
    }

    /// The only address whose rate answers are accepted.
    #[must_use]
    pub const fn oracle(&self) -> Address {
        self.oracle
    }

    /// Pool assets; token A is the asset the rate target is quoted in.
    #[must_use]
    pub const fn token_pair(&self) -> &TokenPair {
        &self.token_pair
    }

    /// LP fee divisor.
    #[must_use]
    pub const fn lp_fee(&self) -> FeeDivisor {
        self.lp_fee
    }

    /// Newton steps per trade.
    #[must_use]
    pub const fn newton_rounds(&self) -> u32 {
        self.newton_rounds
    }

    /// Blocks after which a pending swap can no longer settle.
    #[must_use]
    pub const fn answer_timeout(&self) -> u64 {
        self.answer_timeout
    }

    /// `(precision_a, precision_b)` lifting both tokens to the finer scale.
    #[must_use]
    pub fn precision_multipliers(&self) -> (u128, u128) {
        let a = self.token_pair.token_a().decimals();
        let b = self.token_pair.token_b().decimals();
        let reference = a.max(b);
        (a.precision_multiplier(reference), b.precision_multiplier(reference))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Decimals, Token};

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn pair(dec_a: u8, dec_b: u8) -> TokenPair {
        let (Ok(da), Ok(db)) = (Decimals::new(dec_a), Decimals::new(dec_b)) else {
            panic!("valid decimals");
        };
        let Ok(pair) = TokenPair::new(Token::new(addr(10), da), Token::new(addr(11), db)) else {
            panic!("valid pair");
        };
        pair
    }

    #[test]
    fn precision_follows_decimals() {
        let Ok(cfg) = StableSwapConfig::new(addr(1), addr(2), addr(3), addr(4), pair(6, 18)) else {
            panic!("expected Ok");
        };
        assert_eq!(cfg.precision_multipliers(), (1_000_000_000_000, 1));
        assert_eq!(cfg.newton_rounds(), 5);
    }

    #[test]
    fn zero_timeout_rejected() {
        let Ok(cfg) = StableSwapConfig::new(addr(1), addr(2), addr(3), addr(4), pair(6, 6)) else {
            panic!("expected Ok");
        };
        assert!(cfg.clone().with_answer_timeout(0).is_err());
        assert!(cfg.with_answer_timeout(1).is_ok());
    }
}
