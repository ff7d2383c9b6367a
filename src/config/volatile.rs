//! Configuration for constant-product (volatile asset) pools.

use crate::domain::{Address, FeeDivisor, TokenPair};
use crate::error::AmmError;

/// Default LP fee divisor (0.2%).
pub const DEFAULT_LP_FEE_DIVISOR: u128 = 500;

/// Default system fee divisor (0.1%).
pub const DEFAULT_SYSTEM_FEE_DIVISOR: u128 = 1_000;

/// Default largest trade, in percent of the input reserve.
pub const DEFAULT_MAX_SWAP_LIMIT: u8 = 40;

/// Fee divisors must be strictly above this (fee at most 2%).
pub const MIN_FEE_DIVISOR: u128 = 50;

/// Configuration for a [`VolatilePool`](crate::pools::VolatilePool).
///
/// # Validation
///
/// - the share token is neither pool asset;
/// - both fee divisors are above [`MIN_FEE_DIVISOR`];
/// - `max_swap_limit` is in `1..=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolatilePoolConfig {
    pool_address: Address,
    share_token: Address,
    admin: Address,
    token_pair: TokenPair,
    lp_fee: FeeDivisor,
    system_fee: FeeDivisor,
    max_swap_limit: u8,
}

impl VolatilePoolConfig {
    /// Creates a config with the default fees and swap limit.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if validation fails.
    pub fn new(
        pool_address: Address,
        share_token: Address,
        admin: Address,
        token_pair: TokenPair,
    ) -> Result<Self, AmmError> {
        let config = Self {
            pool_address,
            share_token,
            admin,
            token_pair,
            lp_fee: FeeDivisor::new(DEFAULT_LP_FEE_DIVISOR)?,
            system_fee: FeeDivisor::new(DEFAULT_SYSTEM_FEE_DIVISOR)?,
            max_swap_limit: DEFAULT_MAX_SWAP_LIMIT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replaces both fee divisors.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if either divisor is too small.
    pub fn with_fees(mut self, lp_fee: FeeDivisor, system_fee: FeeDivisor) -> Result<Self, AmmError> {
        self.lp_fee = lp_fee;
        self.system_fee = system_fee;
        self.validate()?;
        Ok(self)
    }

    /// Replaces the swap size limit.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if out of `1..=100`.
    pub fn with_max_swap_limit(mut self, percent: u8) -> Result<Self, AmmError> {
        self.max_swap_limit = percent;
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
        validate_fee_divisor(self.system_fee)?;
        validate_swap_limit(self.max_swap_limit)
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

    /// Pool assets.
    #[must_use]
    pub const fn token_pair(&self) -> &TokenPair {
        &self.token_pair
    }

    /// LP fee divisor.
    #[must_use]
    pub const fn lp_fee(&self) -> FeeDivisor {
        self.lp_fee
    }

    /// System fee divisor.
    #[must_use]
    pub const fn system_fee(&self) -> FeeDivisor {
        self.system_fee
    }

    /// Largest trade in percent of the input reserve.
    #[must_use]
    pub const fn max_swap_limit(&self) -> u8 {
        self.max_swap_limit
    }
}

/// Rejects divisors that would charge more than 2%.
///
/// # Errors
///
/// Returns [`AmmError::InvalidConfiguration`] if `divisor <= 50`.
pub fn validate_fee_divisor(divisor: FeeDivisor) -> Result<(), AmmError> {
    if divisor.get() <= MIN_FEE_DIVISOR {
        return Err(AmmError::InvalidConfiguration("fee divisor must exceed 50"));
    }
    Ok(())
}

/// Rejects swap limits outside `1..=100` percent.
///
/// # Errors
///
/// Returns [`AmmError::InvalidConfiguration`] if out of range.
pub fn validate_swap_limit(percent: u8) -> Result<(), AmmError> {
    if percent == 0 || percent > 100 {
        return Err(AmmError::InvalidConfiguration(
            "max swap limit must be 1..=100 percent",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Decimals, Token};

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn pair() -> TokenPair {
        let Ok(pair) = TokenPair::new(
            Token::new(addr(10), Decimals::MAX),
            Token::new(addr(11), Decimals::MAX),
        ) else {
            panic!("valid pair");
        };
        pair
    }

    fn divisor(d: u128) -> FeeDivisor {
        let Ok(f) = FeeDivisor::new(d) else {
            panic!("non-zero divisor");
        };
        f
    }

    #[test]
    fn defaults() {
        let Ok(cfg) = VolatilePoolConfig::new(addr(1), addr(2), addr(3), pair()) else {
            panic!("expected Ok");
        };
        assert_eq!(cfg.lp_fee().get(), 500);
        assert_eq!(cfg.system_fee().get(), 1_000);
        assert_eq!(cfg.max_swap_limit(), 40);
    }

    #[test]
    fn share_token_must_not_be_an_asset() {
        assert!(VolatilePoolConfig::new(addr(1), addr(10), addr(3), pair()).is_err());
    }

    #[test]
    fn fee_bounds() {
        let Ok(cfg) = VolatilePoolConfig::new(addr(1), addr(2), addr(3), pair()) else {
            panic!("expected Ok");
        };
        assert!(cfg.clone().with_fees(divisor(50), divisor(1_000)).is_err());
        assert!(cfg.clone().with_fees(divisor(51), divisor(51)).is_ok());
        assert!(cfg.clone().with_max_swap_limit(0).is_err());
        assert!(cfg.clone().with_max_swap_limit(101).is_err());
        assert!(cfg.with_max_swap_limit(100).is_ok());
    }
}
