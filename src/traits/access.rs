//! Narrow admin and pause capabilities.

use crate::access::AccessControl;
use crate::domain::{Address, CallContext};
use crate::error::AmmError;

/// A component with a single admin address.
///
/// Implementors only expose their [`AccessControl`]; the guarded setters
/// come for free.
pub trait Administrable {
    /// Borrow the access-control state.
    fn access(&self) -> &AccessControl;

    /// Mutably borrow the access-control state.
    fn access_mut(&mut self) -> &mut AccessControl;

    /// The current admin.
    fn admin(&self) -> Address {
        self.access().admin()
    }

    /// Hands the admin role over.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Unauthorized`] if the caller is not the admin.
    fn change_admin(&mut self, ctx: &CallContext, new_admin: Address) -> Result<(), AmmError> {
        self.access_mut().change_admin(ctx, new_admin)
    }
}

/// A component whose user entrypoints can be paused by the admin.
pub trait Pausable: Administrable {
    /// Whether user entrypoints are currently rejected.
    fn is_paused(&self) -> bool {
        self.access().is_paused()
    }

    /// Pauses or resumes the component.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Unauthorized`] if the caller is not the admin.
    fn set_paused(&mut self, ctx: &CallContext, paused: bool) -> Result<(), AmmError> {
        self.access_mut().set_paused(ctx, paused)
    }
}
