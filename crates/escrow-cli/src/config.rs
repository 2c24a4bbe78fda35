//! # CLI Configuration
//!
//! Optional YAML configuration for the `escrow` binary. Resolution order:
//! the global `--config` flag, then `escrow.yaml` in the working directory,
//! then built-in defaults. A global `--state` flag overrides `state_file`.
//!
//! ```yaml
//! state_file: .escrow/escrow.json
//! opening_balances:
//!   "5f0c1a2e-8d4b-4c1e-9a57-3b2f6d0e1c44": 1000
//! rejecting_parties:
//!   - "b7e2d9f1-0a6c-4e3b-8f15-2c9d4a7e6b10"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use escrow_core::{Amount, PartyId};

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "escrow.yaml";

/// Where the instance is persisted when neither config nor flag says otherwise.
pub const DEFAULT_STATE_FILE: &str = ".escrow/escrow.json";

/// Settings read from the YAML config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EscrowConfig {
    /// Path of the JSON state file.
    pub state_file: PathBuf,
    /// Host balances seeded when an escrow is deployed.
    pub opening_balances: BTreeMap<PartyId, Amount>,
    /// Parties whose payouts are refused by the host.
    pub rejecting_parties: Vec<PartyId>,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            opening_balances: BTreeMap::new(),
            rejecting_parties: Vec::new(),
        }
    }
}

impl EscrowConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist. Without one, `escrow.yaml` in `cwd` is
    /// used if present, else the defaults.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = cwd.join(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            tracing::debug!(path = %fallback.display(), "using config from working directory");
            return Self::load(&fallback);
        }
        Ok(Self::default())
    }

    /// The state file to operate on, honouring a `--state` override.
    pub fn state_file(&self, state_override: Option<&Path>) -> PathBuf {
        state_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.state_file.clone())
    }
}
