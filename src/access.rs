//! Admin and pause guards shared by every component.

use tracing::info;

use crate::domain::{Address, CallContext};
use crate::error::AmmError;

/// The admin address and the global pause flag of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessControl {
    admin: Address,
    paused: bool,
}

impl AccessControl {
    /// Creates an active (unpaused) component administered by `admin`.
    #[must_use]
    pub const fn new(admin: Address) -> Self {
        Self {
            admin,
            paused: false,
        }
    }

    /// The current admin.
    #[must_use]
    pub const fn admin(&self) -> Address {
        self.admin
    }

    /// Whether the component is paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fails unless the caller is the admin.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Unauthorized`] otherwise.
    pub fn ensure_admin(&self, ctx: &CallContext) -> Result<(), AmmError> {
        if ctx.sender() != self.admin {
            return Err(AmmError::Unauthorized("caller is not the admin"));
        }
        Ok(())
    }

    /// Fails while paused.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Paused`] if the component is paused.
    pub const fn ensure_active(&self) -> Result<(), AmmError> {
        if self.paused {
            return Err(AmmError::Paused);
        }
        Ok(())
    }

    /// Hands the admin role to `new_admin`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Unauthorized`] if the caller is not the admin.
    pub fn change_admin(&mut self, ctx: &CallContext, new_admin: Address) -> Result<(), AmmError> {
        self.ensure_admin(ctx)?;
        info!(old = %self.admin, new = %new_admin, "admin changed");
        self.admin = new_admin;
        Ok(())
    }

    /// Pauses or resumes the component.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Unauthorized`] if the caller is not the admin.
    pub fn set_paused(&mut self, ctx: &CallContext, paused: bool) -> Result<(), AmmError> {
        self.ensure_admin(ctx)?;
        info!(paused, "pause flag changed");
        self.paused = paused;
        Ok(())
    }
}
