//! Coarse-grained serialisation for shared components.
//!
//! Every public operation on a pool, staking pool or vault must run to
//! completion before another one observes its state.  [`Serialized`] holds a
//! component behind one mutex and runs each logical operation as a single
//! closure under that lock.  Two-phase operations stay exclusive across the
//! suspension through the component's own pending slot, not through the
//! lock.

use std::sync::{Arc, Mutex};

use crate::error::AmmError;

/// A component shared between threads, one operation at a time.
#[derive(Debug, Default)]
pub struct Serialized<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for Serialized<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Serialized<T> {
    /// Wraps `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Runs `op` with exclusive access and returns its result.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InvalidState`] if an earlier operation panicked while
    ///   holding the lock.
    /// - Whatever `op` returns.
    pub fn with<R>(&self, op: impl FnOnce(&mut T) -> Result<R, AmmError>) -> Result<R, AmmError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| AmmError::InvalidState("component lock poisoned"))?;
        op(&mut *guard)
    }

    /// Copies the current state out for read-only inspection.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InvalidState`] if the lock is poisoned.
    pub fn snapshot(&self) -> Result<T, AmmError>
    where
        T: Clone,
    {
        self.with(|value| Ok(value.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn concurrent_operations_do_not_interleave() {
        let shared = Serialized::new((0u64, 0u64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let step = shared.with(|(a, b)| {
                            *a += 1;
                            thread::yield_now();
                            *b += 1;
                            if a != b {
                                return Err(AmmError::InvalidState("torn update"));
                            }
                            Ok(())
                        });
                        if step.is_err() {
                            return false;
                        }
                    }
                    true
                })
            })
            .collect();
        for handle in handles {
            assert!(matches!(handle.join(), Ok(true)));
        }
        assert_eq!(shared.snapshot(), Ok((8_000, 8_000)));
    }

    #[test]
    fn errors_from_the_operation_pass_through() {
        let shared = Serialized::new(5u32);
        let result: Result<(), _> = shared.with(|v| {
            *v += 1;
            Err(AmmError::Paused)
        });
        assert_eq!(result, Err(AmmError::Paused));
        assert_eq!(shared.snapshot(), Ok(6));
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let shared = Serialized::new(0u8);
        let clone = shared.clone();
        let joined = thread::spawn(move || {
            let _ = clone.with(|_| -> Result<(), AmmError> { panic!("operation failed midway") });
        })
        .join();
        assert!(joined.is_err());
        assert!(matches!(shared.with(|v| Ok(*v)), Err(AmmError::InvalidState(_))));
    }
}
