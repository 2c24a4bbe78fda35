//! # State File
//!
//! A deployed escrow lives in one JSON file: the engine record, the host
//! balances, and the accumulated event and transition logs. Commands load
//! the file, rebuild the engine, run one operation, and write the file back
//! only if the operation succeeded.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use escrow_core::{Amount, PartyId};
use escrow_state::{AccountBook, Escrow, EscrowEvent, EscrowRecord, EscrowTransitionRecord};

/// Everything persisted for one escrow instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    /// Engine state.
    pub record: EscrowRecord,
    /// Host balance of every party that ever held value.
    pub balances: BTreeMap<PartyId, Amount>,
    /// Every event the instance emitted, oldest first.
    pub events: Vec<EscrowEvent>,
    /// Every lifecycle transition, oldest first.
    pub transitions: Vec<EscrowTransitionRecord>,
    /// When the instance was deployed.
    pub created_at: DateTime<Utc>,
    /// When the file was last written.
    pub updated_at: DateTime<Utc>,
}

impl StateFile {
    /// Capture a freshly deployed escrow and its host book.
    pub fn deployed(escrow: &Escrow, book: &AccountBook) -> Self {
        let now = Utc::now();
        Self {
            record: escrow.record(),
            balances: book.balances(),
            events: escrow.events(),
            transitions: escrow.transitions(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Read a state file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "no escrow deployed at {} (run `escrow deploy` first)",
                path.display()
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading state file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid state file: {}", path.display()))
    }

    /// Write the state file, creating its parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create state directory: {}", parent.display())
                })?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing state file: {}", path.display()))?;
        Ok(())
    }

    /// Host book holding the persisted balances. `rejecting` parties refuse
    /// every payout.
    pub fn book(&self, rejecting: &[PartyId]) -> Rc<AccountBook> {
        let book = AccountBook::with_balances(self.balances.clone());
        for party in rejecting {
            book.reject_payments_to(*party);
        }
        Rc::new(book)
    }

    /// Rebuild the engine over `book`.
    pub fn engine(&self, book: Rc<AccountBook>) -> Result<Escrow> {
        Escrow::from_record(&self.record, book).context("state file violates escrow invariants")
    }

    /// Fold the outcome of a successful operation back into the file.
    ///
    /// The rebuilt engine starts with empty logs, so its entries are exactly
    /// the ones produced by this run.
    pub fn absorb(&mut self, escrow: &Escrow, book: &AccountBook) {
        self.record = escrow.record();
        self.balances = book.balances();
        self.events.extend(escrow.events());
        self.transitions.extend(escrow.transitions());
        self.updated_at = Utc::now();
    }
}
