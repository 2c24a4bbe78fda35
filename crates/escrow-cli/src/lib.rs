//! # escrow-cli — Escrow Command-Line Interface
//!
//! Provides the `escrow` binary: a thin driver that persists one escrow
//! instance in a local JSON state file and runs engine operations against
//! it with an in-memory host book.
//!
//! ## Subcommands
//!
//! - `escrow deploy` — Construct an escrow.
//! - `escrow deposit` — Fund it.
//! - `escrow release` / `escrow refund` — Resolve it.
//! - `escrow balance` / `escrow status` — Inspect it.
//!
//! ```bash
//! escrow deploy --from "$D" --beneficiary "$B" --arbiter "$A"
//! escrow deposit --from "$D" --value 100
//! escrow release --from "$A"
//! escrow status --json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers live in `commands`.
//! - Handlers delegate to `escrow-state`; no escrow rules are decided here.

pub mod commands;
pub mod config;
pub mod state;

