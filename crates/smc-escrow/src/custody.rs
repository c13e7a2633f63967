//! # Token Custody
//!
//! The escrow never moves tokens itself. It instructs a [`TokenCustody`]
//! collaborator to transfer the accumulated total out of escrow custody on
//! recovery, and that collaborator can refuse. [`InMemoryToken`] is a
//! balance-sheet implementation used by the CLI's local deployment and by
//! tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use smc_core::{Address, Amount};

/// Errors raised by a custody collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// The sending holder does not own enough tokens.
    #[error("insufficient balance for {holder}: requested {requested}, available {available}")]
    InsufficientBalance {
        /// The sending holder.
        holder: Address,
        /// The requested transfer amount.
        requested: Amount,
        /// The holder's balance.
        available: Amount,
    },

    /// Crediting the receiver would overflow its balance.
    #[error("balance overflow for {holder}")]
    BalanceOverflow {
        /// The receiving holder.
        holder: Address,
    },
}

/// A fungible-token balance sheet the escrow can move funds through.
pub trait TokenCustody {
    /// The token's own identity.
    fn token(&self) -> Address;

    /// Balance held by `holder`.
    fn balance_of(&self, holder: &Address) -> Amount;

    /// Move `amount` from `from` to `to`. All-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError`] if `from` cannot cover `amount` or `to`
    /// cannot receive it.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount)
        -> Result<(), CustodyError>;
}

/// An in-memory fungible token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryToken {
    address: Address,
    balances: BTreeMap<Address, Amount>,
    total_supply: Amount,
}

impl InMemoryToken {
    /// Create a token with no supply.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: BTreeMap::new(),
            total_supply: Amount::ZERO,
        }
    }

    /// Issue `amount` new tokens to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`CustodyError::BalanceOverflow`] if the supply would overflow.
    pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), CustodyError> {
        let overflow = || CustodyError::BalanceOverflow { holder: *to };
        let supply = self.total_supply.checked_add(amount).ok_or_else(overflow)?;
        let balance = self.balance_of(to).checked_add(amount).ok_or_else(overflow)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }

    /// Total tokens in existence.
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// All non-zero balances, ordered by holder.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter().filter(|(_, amount)| !amount.is_zero())
    }
}

impl TokenCustody for InMemoryToken {
    fn token(&self) -> Address {
        self.address
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let available = self.balance_of(from);
        let remaining =
            available
                .checked_sub(amount)
                .ok_or(CustodyError::InsufficientBalance {
                    holder: *from,
                    requested: amount,
                    available,
                })?;
        if from == to {
            return Ok(());
        }
        let received = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(CustodyError::BalanceOverflow { holder: *to })?;
        self.balances.insert(*from, remaining);
        self.balances.insert(*to, received);
        Ok(())
    }
}
