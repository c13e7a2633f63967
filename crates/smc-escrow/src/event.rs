//! # Domain Events
//!
//! Observers and indexers consume these records. Field names and their
//! order are part of the observable contract:
//!
//! - `AcceptedMigration(source_owner, amount, total)`
//! - `TokensRecovered(caller, dest, amount)`

use serde::{Deserialize, Serialize};

use smc_core::{Address, Amount, Timestamp};

/// An event emitted by a successful escrow operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum EscrowEvent {
    /// A migrated batch was credited.
    AcceptedMigration {
        /// The stake owner the batch was migrated for.
        source_owner: Address,
        /// The amount credited by this batch.
        amount: Amount,
        /// The accumulated total after crediting.
        total: Amount,
    },
    /// The accumulated total was released to the destination.
    TokensRecovered {
        /// The identity that triggered recovery.
        caller: Address,
        /// The receiving identity.
        dest: Address,
        /// The amount released.
        amount: Amount,
    },
}

impl EscrowEvent {
    /// The canonical event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AcceptedMigration { .. } => "AcceptedMigration",
            Self::TokensRecovered { .. } => "TokensRecovered",
        }
    }
}

/// An emitted event together with its position in the escrow's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Zero-based position in the log.
    pub sequence: u64,
    /// Clock reading of the operation that emitted it.
    pub emitted_at: Timestamp,
    /// The event itself.
    #[serde(flatten)]
    pub event: EscrowEvent,
}
