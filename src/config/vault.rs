//! Configuration for the single-sided share vault and its reward manager.

use crate::domain::Address;
use crate::error::AmmError;

/// Default number of blocks a balance answer may take.
pub const DEFAULT_BALANCE_TIMEOUT: u64 = 100;

/// Configuration for a [`Vault`](crate::vault::Vault).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VaultConfig {
    vault: Address,
    admin: Address,
    backing_token: Address,
    share_token: Address,
    reward_manager: Address,
    answer_timeout: u64,
}

impl VaultConfig {
    /// Creates a config with the default answer timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if validation fails.
    pub fn new(
        vault: Address,
        admin: Address,
        backing_token: Address,
        share_token: Address,
        reward_manager: Address,
    ) -> Result<Self, AmmError> {
        let config = Self {
            vault,
            admin,
            backing_token,
            share_token,
            reward_manager,
            answer_timeout: DEFAULT_BALANCE_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replaces the balance answer timeout.
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
        if self.backing_token == self.share_token {
            return Err(AmmError::InvalidConfiguration(
                "share token must differ from the backing token",
            ));
        }
        if self.answer_timeout == 0 {
            return Err(AmmError::InvalidConfiguration("answer timeout must be positive"));
        }
        Ok(())
    }

    /// Address of the vault.
    #[must_use]
    pub const fn vault(&self) -> Address {
        self.vault
    }

    /// Initial admin.
    #[must_use]
    pub const fn admin(&self) -> Address {
        self.admin
    }

    /// Token deposited into the vault.
    #[must_use]
    pub const fn backing_token(&self) -> Address {
        self.backing_token
    }

    /// Share token minted by the vault.
    #[must_use]
    pub const fn share_token(&self) -> Address {
        self.share_token
    }

    /// Reward manager flushed before every operation.
    #[must_use]
    pub const fn reward_manager(&self) -> Address {
        self.reward_manager
    }

    /// Blocks after which a pending operation can no longer settle.
    #[must_use]
    pub const fn answer_timeout(&self) -> u64 {
        self.answer_timeout
    }
}

/// Configuration for a [`RewardManager`](crate::vault::RewardManager).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardManagerConfig {
    manager: Address,
    admin: Address,
    vault: Address,
    backing_token: Address,
    answer_timeout: u64,
}

impl RewardManagerConfig {
    /// Creates a config with the default answer timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] if validation fails.
    pub fn new(
        manager: Address,
        admin: Address,
        vault: Address,
        backing_token: Address,
    ) -> Result<Self, AmmError> {
        let config = Self {
            manager,
            admin,
            vault,
            backing_token,
            answer_timeout: DEFAULT_BALANCE_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates all invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidConfiguration`] on the first violation.
    pub fn validate(&self) -> Result<(), AmmError> {
        if self.manager == self.vault {
            return Err(AmmError::InvalidConfiguration(
                "reward manager and vault must be distinct",
            ));
        }
        if self.answer_timeout == 0 {
            return Err(AmmError::InvalidConfiguration("answer timeout must be positive"));
        }
        Ok(())
    }

    /// Address of the manager.
    #[must_use]
    pub const fn manager(&self) -> Address {
        self.manager
    }

    /// Initial admin.
    #[must_use]
    pub const fn admin(&self) -> Address {
        self.admin
    }

    /// The only caller allowed to pull rewards.
    #[must_use]
    pub const fn vault(&self) -> Address {
        self.vault
    }

    /// Token the rewards are paid in.
    #[must_use]
    pub const fn backing_token(&self) -> Address {
        self.backing_token
    }

    /// Blocks after which a pending balance refresh can no longer settle.
    #[must_use]
    pub const fn answer_timeout(&self) -> u64 {
        self.answer_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    #[test]
    fn vault_tokens_must_differ() {
        assert!(VaultConfig::new(addr(1), addr(2), addr(3), addr(3), addr(4)).is_err());
        assert!(VaultConfig::new(addr(1), addr(2), addr(3), addr(5), addr(4)).is_ok());
    }

    #[test]
    fn manager_must_not_be_the_vault() {
        assert!(RewardManagerConfig::new(addr(1), addr(2), addr(1), addr(3)).is_err());
        assert!(RewardManagerConfig::new(addr(4), addr(2), addr(1), addr(3)).is_ok());
    }
}
