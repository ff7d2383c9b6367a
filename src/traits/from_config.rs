//! Construction of components from validated configuration.
//!
//! Every pool, the staking pool, the vault and the reward manager
//! implement [`FromConfig`] for their own config struct.  There is no
//! blanket implementation: each pairing is explicit.

use crate::error::AmmError;

/// Builds a component from its configuration.
///
/// Implementations re-run the config's `validate()` so that a
/// deserialised config can never produce an invalid component.
///
/// # Errors
///
/// Returns [`AmmError::InvalidConfiguration`] (or a more specific variant)
/// if the configuration is invalid.
pub trait FromConfig<C> {
    /// Creates a new component from `config`.
    ///
    /// # Errors
    ///
    /// See the trait documentation.
    fn from_config(config: &C) -> Result<Self, AmmError>
    where
        Self: Sized;
}
