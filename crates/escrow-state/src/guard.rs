//! # Reentrancy Guard
//!
//! A call-depth latch held for the duration of `release()` and `refund()`.
//! Entering while the latch is held fails with `ReentrantCall` before any
//! escrow state is read or written. The latch is released by dropping the
//! [`GuardToken`], so every exit path (success, error, or unwinding)
//! clears it.
//!
//! This is independent of the mutate-before-transfer ordering in the
//! engine: the ordering rejects reentry into any state-changing operation
//! through the `NotFunded` check, the latch rejects nested reentry into the
//! resolution operations themselves.

use std::cell::Cell;

use crate::error::EscrowError;
use crate::escrow::Resolution;

/// Single-slot latch recording which resolution is currently in progress.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    active: Cell<Option<Resolution>>,
}

impl ReentrancyGuard {
    /// Create an unlatched guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the latch for `operation`.
    ///
    /// # Errors
    ///
    /// `ReentrantCall` if the latch is already held.
    pub fn enter(&self, operation: Resolution) -> Result<GuardToken<'_>, EscrowError> {
        if let Some(active) = self.active.get() {
            return Err(EscrowError::ReentrantCall {
                attempted: operation,
                active,
            });
        }
        self.active.set(Some(operation));
        Ok(GuardToken { guard: self })
    }

    /// Whether the latch is held.
    pub fn is_entered(&self) -> bool {
        self.active.get().is_some()
    }
}

/// Scoped ownership of the latch. Dropping it releases the latch.
#[derive(Debug)]
#[must_use = "the latch is released as soon as the token is dropped"]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.active.set(None);
    }
}
