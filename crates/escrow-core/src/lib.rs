//! # escrow-core — Foundational Types for the Escrow Stack
//!
//! Leaf crate of the workspace. Defines the primitives every other crate
//! builds on; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `PartyId` identifies a
//!    transaction sender or payee. It has a distinguished null identity,
//!    which is never a valid escrow role. `EscrowId` names one deployed
//!    escrow instance.
//!
//! 2. **Integer-only value.** `Amount` wraps a `u64` and exposes checked
//!    arithmetic only. There is no float path for value anywhere in the stack.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision and
//!    renders with a `Z` suffix.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `escrow-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use amount::Amount;
pub use error::CoreError;
pub use identity::{EscrowId, PartyId};
pub use temporal::Timestamp;
