//! # Accumulator Ledger
//!
//! The running total of migrated tokens held by the escrow and not yet
//! recovered. Crate-private: the only path to [`AccumulatorLedger::credit`]
//! is through the escrow's authorized `accept_migration`.

use smc_core::Amount;

use crate::error::EscrowError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AccumulatorLedger {
    total: Amount,
}

impl AccumulatorLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn restore(total: Amount) -> Self {
        Self { total }
    }

    pub(crate) fn total(&self) -> Amount {
        self.total
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.total.is_zero()
    }

    /// Add `amount` and return the new total. The total is untouched on error.
    pub(crate) fn credit(&mut self, amount: Amount) -> Result<Amount, EscrowError> {
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount {
                amount,
                reason: "amount must be positive".to_string(),
            });
        }
        let total = self
            .total
            .checked_add(amount)
            .ok_or_else(|| EscrowError::InvalidAmount {
                amount,
                reason: format!("crediting would overflow total {}", self.total),
            })?;
        self.total = total;
        Ok(total)
    }

    /// Zero the total and return what it was.
    pub(crate) fn drain(&mut self) -> Result<Amount, EscrowError> {
        if self.is_empty() {
            return Err(EscrowError::NothingToRecover);
        }
        Ok(std::mem::take(&mut self.total))
    }
}
