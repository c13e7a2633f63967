//! # Escrow Configuration
//!
//! Construction parameters for a migration escrow, in contract order:
//! token, stake owner, destination, authorized source, cooldown.
//!
//! ## Authorized Source Binding
//!
//! Two deployment configurations exist. In one the legacy staking system's
//! address is passed explicitly. In the other it is omitted and the
//! identity that deploys the escrow becomes the authorized source. Both are
//! expressed by [`SourceBinding`] and resolved at deployment time.
//!
//! ## File Format
//!
//! ```yaml
//! token: "0xff56cc6b1e6ded347aa0b7676c85ab0b3d08b0fa"
//! stake_owner: "0xae4e8fcbd07459789d6126b1917746d66db7ea0c"
//! dest_address: "0x6498ed4e7577584a59e621e42de4ed0dce80c136"
//! authorized_source: "0x01d59af68e2dcb44e04c50e05f62e7043f2656c3"  # omit to bind the deployer
//! cooldown_days: 14                                                   # or cooldown_seconds
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smc_core::Address;

use crate::cooldown::CooldownDuration;

/// Domain label mixed into custody address derivation.
pub const CUSTODY_DERIVATION_LABEL: &str = "smc/migration-escrow";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required identity is the zero address.
    #[error("{field} must not be the zero address")]
    ZeroAddress {
        /// The offending field.
        field: &'static str,
    },

    /// Both or neither of `cooldown_seconds` / `cooldown_days` were given.
    #[error("exactly one of cooldown_seconds or cooldown_days must be set")]
    CooldownUnspecified,

    /// A persisted snapshot is internally inconsistent.
    #[error("invalid escrow snapshot: {reason}")]
    InvalidSnapshot {
        /// What is inconsistent.
        reason: String,
    },

    /// YAML or JSON parse failure.
    #[error("failed to parse escrow configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// I/O failure reading a configuration file.
    #[error("failed to read escrow configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// How the identity allowed to call `accept_migration` is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceBinding {
    /// The legacy staking system's address, given at construction.
    Explicit(Address),
    /// Whoever deploys the escrow.
    Deployer,
}

impl SourceBinding {
    /// Resolve the binding against the deploying identity.
    pub fn resolve(&self, deployer: &Address) -> Address {
        match self {
            Self::Explicit(source) => *source,
            Self::Deployer => *deployer,
        }
    }
}

impl From<Option<Address>> for SourceBinding {
    fn from(source: Option<Address>) -> Self {
        source.map_or(Self::Deployer, Self::Explicit)
    }
}

/// Escrow construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EscrowConfig {
    /// The migrated token.
    pub token: Address,
    /// The beneficiary, the only identity allowed to recover.
    pub stake_owner: Address,
    /// Receiver of recovered tokens.
    pub dest_address: Address,
    /// The legacy staking system; `None` binds the deployer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_source: Option<Address>,
    /// Cooldown in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u64>,
    /// Cooldown in whole days, converted to seconds at construction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_days: Option<u64>,
}

impl EscrowConfig {
    /// Build a configuration from the five construction parameters.
    pub fn new(
        token: Address,
        stake_owner: Address,
        dest_address: Address,
        authorized_source: SourceBinding,
        cooldown: CooldownDuration,
    ) -> Self {
        Self {
            token,
            stake_owner,
            dest_address,
            authorized_source: match authorized_source {
                SourceBinding::Explicit(source) => Some(source),
                SourceBinding::Deployer => None,
            },
            cooldown_seconds: Some(cooldown.as_seconds()),
            cooldown_days: None,
        }
    }

    /// Parse a YAML (or JSON) document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input and any
    /// [`validate`](Self::validate) error.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// as [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check identities and the cooldown settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroAddress`] or
    /// [`ConfigError::CooldownUnspecified`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let identities = [
            ("token", Some(self.token)),
            ("stake_owner", Some(self.stake_owner)),
            ("dest_address", Some(self.dest_address)),
            ("authorized_source", self.authorized_source),
        ];
        for (field, address) in identities {
            if address.is_some_and(|a| a.is_zero()) {
                return Err(ConfigError::ZeroAddress { field });
            }
        }
        self.cooldown().map(|_| ())
    }

    /// The cooldown as a literal second count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CooldownUnspecified`] unless exactly one of
    /// the two cooldown fields is set.
    pub fn cooldown(&self) -> Result<CooldownDuration, ConfigError> {
        match (self.cooldown_seconds, self.cooldown_days) {
            (Some(secs), None) => Ok(CooldownDuration::from_seconds(secs)),
            (None, Some(days)) => Ok(CooldownDuration::from_days(days)),
            _ => Err(ConfigError::CooldownUnspecified),
        }
    }

    /// The authorized-source binding.
    pub fn source_binding(&self) -> SourceBinding {
        SourceBinding::from(self.authorized_source)
    }
}

/// Who deploys an escrow, and which of their deployments this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployContext {
    /// The deploying identity.
    pub deployer: Address,
    /// Distinguishes multiple escrows deployed by the same identity.
    pub nonce: u64,
}

impl DeployContext {
    /// Create a deployment context.
    pub fn new(deployer: Address, nonce: u64) -> Self {
        Self { deployer, nonce }
    }

    /// The escrow's own custody address.
    pub fn custody_address(&self) -> Address {
        Address::derive(&self.deployer, CUSTODY_DERIVATION_LABEL, self.nonce)
    }
}
