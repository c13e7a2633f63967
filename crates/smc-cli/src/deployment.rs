//! # Deployment State
//!
//! The simulated deployment is stored as a single `deployment.json` in the
//! state directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use smc_core::{Address, Clock};
use smc_escrow::{EscrowSnapshot, InMemoryToken, LegacyStaking, MigrationEscrow};

/// File name of the persisted deployment.
pub const DEPLOYMENT_FILE: &str = "deployment.json";

/// Everything the CLI operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Identity that deployed the escrow.
    pub deployer: Address,
    /// The migrated token's balance sheet.
    pub token: InMemoryToken,
    /// The legacy staking system.
    pub staking: LegacyStaking,
    /// The escrow account.
    pub escrow: EscrowSnapshot,
}

impl Deployment {
    /// Location of the deployment file inside `state_dir`.
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(DEPLOYMENT_FILE)
    }

    /// Whether a deployment already exists in `state_dir`.
    pub fn exists(state_dir: &Path) -> bool {
        Self::path(state_dir).is_file()
    }

    /// Read the deployment from `state_dir`.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let path = Self::path(state_dir);
        if !path.is_file() {
            bail!(
                "no deployment found in {}: run `smc init` first",
                state_dir.display()
            );
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Write the deployment to `state_dir`, creating the directory if needed.
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(state_dir).context("failed to create state directory")?;
        let path = Self::path(state_dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "deployment saved");
        Ok(())
    }

    /// Rebuild the live escrow against `clock`.
    pub fn open_escrow<C: Clock>(&self, clock: C) -> Result<MigrationEscrow<C>> {
        MigrationEscrow::restore(self.escrow.clone(), clock).context("corrupt escrow state")
    }

    /// Record the escrow's current state.
    pub fn store_escrow<C: Clock>(&mut self, escrow: &MigrationEscrow<C>) {
        self.escrow = escrow.snapshot();
    }
}
