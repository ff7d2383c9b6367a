//! Single-slot two-phase request tracking.
//!
//! A component that must wait for an external answer parks the saved
//! parameters in a [`PendingSlot`]:
//!
//! ```text
//!   Idle --begin--> Awaiting{id, params, deadline} --complete(id)--> Idle
//!                          |                  \
//!                       cancel            deadline passes
//!                          v                    v
//!                        Idle        discarded by next begin/cancel
//! ```
//!
//! While a request is live every new `begin` fails with
//! [`AmmError::Locked`].  Answers are matched by id; a stale or foreign id
//! never touches the slot.

use tracing::warn;

use super::RequestId;
use crate::domain::BlockHeight;
use crate::error::AmmError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Awaiting<P> {
    id: RequestId,
    params: P,
    issued_at: BlockHeight,
    deadline: BlockHeight,
}

/// Holds at most one outstanding request and its saved parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSlot<P> {
    next_id: u64,
    awaiting: Option<Awaiting<P>>,
}

impl<P> Default for PendingSlot<P> {
    fn default() -> Self {
        Self {
            next_id: 1,
            awaiting: None,
        }
    }
}

impl<P> PendingSlot<P> {
    /// Creates an idle slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a request is outstanding and still answerable.
    #[must_use]
    pub fn is_live(&self, now: BlockHeight) -> bool {
        self.awaiting.as_ref().is_some_and(|a| now <= a.deadline)
    }

    /// Returns the id of the outstanding request, live or expired.
    #[must_use]
    pub fn current_id(&self) -> Option<RequestId> {
        self.awaiting.as_ref().map(|a| a.id)
    }

    /// Fails with [`AmmError::Locked`] while a request is live.
    ///
    /// # Errors
    ///
    /// See above.
    pub fn ensure_idle(&self, now: BlockHeight) -> Result<(), AmmError> {
        if self.is_live(now) {
            return Err(AmmError::Locked("a request is awaiting its answer"));
        }
        Ok(())
    }

    /// Parks `params` and returns the id the answer must carry.
    ///
    /// An expired request still occupying the slot is dropped.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Locked`] if a live request exists.
    /// - [`AmmError::Overflow`] if the deadline overflows.
    pub fn begin(
        &mut self,
        params: P,
        now: BlockHeight,
        timeout_blocks: u64,
    ) -> Result<RequestId, AmmError> {
        self.ensure_idle(now)?;
        let deadline = now
            .checked_add(timeout_blocks)
            .ok_or(AmmError::Overflow("request deadline"))?;
        if let Some(stale) = self.awaiting.take() {
            warn!(id = %stale.id, issued_at = %stale.issued_at, "dropping expired request");
        }
        let id = RequestId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.awaiting = Some(Awaiting {
            id,
            params,
            issued_at: now,
            deadline,
        });
        Ok(id)
    }

    /// Returns the saved parameters if `id` matches a live request.
    ///
    /// Does not change the slot, so callers can validate everything before
    /// calling [`complete`](Self::complete).
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidState`] if nothing is pending, the id does
    /// not match, or the deadline has passed.
    pub fn peek(&self, id: RequestId, now: BlockHeight) -> Result<&P, AmmError> {
        let Some(awaiting) = self.awaiting.as_ref() else {
            return Err(AmmError::InvalidState("no request is pending"));
        };
        if awaiting.id != id {
            return Err(AmmError::InvalidState("answer does not match the pending request"));
        }
        if now > awaiting.deadline {
            return Err(AmmError::InvalidState("pending request has expired"));
        }
        Ok(&awaiting.params)
    }

    /// Clears the slot after a successful settlement of `id`.
    ///
    /// Returns the saved parameters, or `None` if `id` is not the pending
    /// request.
    pub fn complete(&mut self, id: RequestId) -> Option<P> {
        if self.current_id() != Some(id) {
            return None;
        }
        self.awaiting.take().map(|a| a.params)
    }

    /// Abandons the outstanding request, live or expired.
    pub fn cancel(&mut self) -> Option<P> {
        let awaiting = self.awaiting.take()?;
        warn!(id = %awaiting.id, "pending request cancelled");
        Some(awaiting.params)
    }
}
