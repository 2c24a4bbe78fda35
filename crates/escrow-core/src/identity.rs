//! # Party Identity
//!
//! `PartyId` is the stable, address-like identity of a transaction sender
//! or payee. Role checks in the escrow engine compare `PartyId`s exactly.
//!
//! ## Security Invariant
//!
//! The null identity ([`PartyId::NULL`]) stands for "nobody". It can be
//! parsed and compared like any other identity, but the engine refuses it
//! as a beneficiary or arbiter at construction time.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Identity of a party able to call the escrow or receive value from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub Uuid);

impl PartyId {
    /// The null identity. Never a valid beneficiary or arbiter.
    pub const NULL: PartyId = PartyId(Uuid::nil());

    /// Generate a new random party identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Whether this is the null identity.
    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

/// Unique identifier for one deployed escrow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EscrowId(pub Uuid);

impl EscrowId {
    /// Generate a new random escrow identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for EscrowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "escrow:{}", self.0)
    }
}

impl std::fmt::Display for PartyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "party:{}", self.0)
    }
}

impl FromStr for PartyId {
    type Err = CoreError;

    /// Accepts either a bare UUID or the `party:`-prefixed display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let raw = trimmed.strip_prefix("party:").unwrap_or(trimmed);
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|e| CoreError::InvalidParty {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}
