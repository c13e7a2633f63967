//! # smc-escrow: Staking Migration Escrow
//!
//! Holds stake migrated out of a legacy staking system until a cooldown
//! has passed, then releases it to a destination chosen at deployment.
//!
//! - **Guard** ([`guard`]): caller-identity checks run before any mutation.
//!
//! - **Cooldown** ([`cooldown`]): literal second-count cooldowns, re-armed
//!   from "now" on every accepted migration.
//!
//! - **Escrow** ([`escrow`]): the orchestrator. `accept_migration` credits
//!   a batch, `recover_tokens` releases the total.
//!
//! - **Custody** ([`custody`]): the token balance sheet the escrow releases
//!   funds through.
//!
//! - **Staking** ([`staking`]): the legacy staking system that migrates
//!   stake into an escrow.
//!
//! - **Config** ([`config`]): construction parameters and YAML loading.
//!
//! ## Crate Policy
//!
//! - Depends only on `smc-core` internally.
//! - The accumulator ledger is crate-private; crediting is only reachable
//!   through the authorized `accept_migration`.

pub mod config;
pub mod cooldown;
pub mod custody;
pub mod error;
pub mod escrow;
pub mod event;
pub mod guard;
mod ledger;
pub mod staking;

// Re-export primary types.
pub use config::{ConfigError, DeployContext, EscrowConfig, SourceBinding};
pub use cooldown::{CooldownDuration, SECONDS_PER_DAY};
pub use custody::{CustodyError, InMemoryToken, TokenCustody};
pub use error::{EscrowError, Operation};
pub use escrow::{EscrowPhase, EscrowSnapshot, MigrationEscrow};
pub use event::{EscrowEvent, EventRecord};
pub use staking::{LegacyStaking, StakingError};
