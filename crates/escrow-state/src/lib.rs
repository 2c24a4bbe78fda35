//! # escrow-state — Escrow Engine
//!
//! A single-instance, three-party conditional payment holder. A depositor
//! funds the escrow once; a designated arbiter later directs the value
//! either to the beneficiary (`release`) or back to the depositor
//! (`refund`). The instance is single-use: once resolved it never accepts
//! another deposit.
//!
//! ## Modules
//!
//! - **Escrow** (`escrow.rs`): the state machine
//!   `Created → Funded → Resolved` and its transfer discipline.
//!
//! - **Guard** (`guard.rs`): the reentrancy latch held around release and
//!   refund.
//!
//! - **Recipient** (`recipient.rs`): the `PayableRecipient` seam through
//!   which every payout flows, and the in-memory `AccountBook` host.
//!
//! - **Event** (`event.rs`): `Deposited` / `Released` / `Refunded`
//!   notifications and the transition audit log.
//!
//! - **Record** (`record.rs`): the persisted instance layout and its
//!   invariant checks.
//!
//! ## Atomicity
//!
//! Every public operation either applies all of its effects or none. There
//! is no enclosing transactional runtime: a failed or panicking payout
//! restores the pre-call ledger snapshot and truncates the logs from a drop
//! guard before control leaves the engine.
//!
//! ## Threading
//!
//! `Escrow` is `!Sync`. Reentrancy is a nested call on the same thread,
//! made by a recipient while a payout is in flight; there is no concurrent
//! access to defend against.

pub mod error;
pub mod escrow;
pub mod event;
pub mod guard;
pub mod recipient;
pub mod record;

pub use error::{EscrowError, EscrowErrorKind, RecordError, TransferError};
pub use escrow::{Escrow, EscrowState, Resolution, Role};
pub use event::{EscrowEvent, EscrowTransitionRecord};
pub use guard::{GuardToken, ReentrancyGuard};
pub use recipient::{AccountBook, PayableRecipient, Payment};
pub use record::EscrowRecord;
