//! # Escrow Error Types
//!
//! Every error in this module is a rejection: the attempted operation had
//! no effect on the escrow. Variants carry the identities, amounts and
//! instants involved so that a rejected call can be diagnosed from the
//! error alone.

use thiserror::Error;

use smc_core::{Address, Amount, Timestamp};

use crate::custody::CustodyError;

/// The state-changing operations an escrow exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Crediting a migrated batch.
    AcceptMigration,
    /// Releasing the accumulated total to the destination.
    RecoverTokens,
}

impl Operation {
    /// The canonical operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AcceptMigration => "acceptMigration",
            Self::RecoverTokens => "recoverTokens",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors arising from escrow operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Caller identity does not match the identity the operation requires.
    #[error("unauthorized {operation}: caller {actual} is not {expected}")]
    Unauthorized {
        /// The operation that was attempted.
        operation: Operation,
        /// The identity the operation requires.
        expected: Address,
        /// The identity that attempted it.
        actual: Address,
    },

    /// A zero or otherwise unusable amount was supplied to a credit.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Amount,
        /// Why it was rejected.
        reason: String,
    },

    /// Recovery attempted while nothing has been accumulated.
    #[error("no tokens to recover: call acceptMigration first")]
    NothingToRecover,

    /// Recovery attempted before the cooldown expired.
    #[error("cooldown hasn't finished yet: now {now}, expires {expiry}")]
    CooldownNotElapsed {
        /// The clock reading used by the rejected call.
        now: Timestamp,
        /// The armed expiry.
        expiry: Timestamp,
    },

    /// The custody collaborator manages a different token than the escrow holds.
    #[error("token mismatch: escrow holds {expected}, custody manages {actual}")]
    TokenMismatch {
        /// The escrow's configured token.
        expected: Address,
        /// The token managed by the supplied custody.
        actual: Address,
    },

    /// The token custody collaborator refused the release transfer.
    #[error("custody transfer failed: {0}")]
    Custody(#[from] CustodyError),
}
