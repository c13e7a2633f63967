//! # Authorization Guard
//!
//! Caller identity is an explicit argument on every state-changing
//! operation; this module compares it against the identity the operation
//! is bound to. The check is pure and must run before the ledger or the
//! cooldown timer is touched.

use smc_core::Address;

use crate::error::{EscrowError, Operation};

/// Require that `actual` is the identity bound to `operation`.
///
/// # Errors
///
/// Returns [`EscrowError::Unauthorized`] when the identities differ.
pub fn require_caller(
    actual: &Address,
    expected: &Address,
    operation: Operation,
) -> Result<(), EscrowError> {
    if actual != expected {
        return Err(EscrowError::Unauthorized {
            operation,
            expected: *expected,
            actual: *actual,
        });
    }
    Ok(())
}
