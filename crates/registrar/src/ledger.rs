//! Token ledger interface consumed by the registrar
//!
//! The registrar never holds balances itself: deposits and payments are pulled
//! from the payer with `transfer_from` against an allowance the payer granted
//! beforehand, and refunds are pushed back with `transfer` from the
//! registrar's own account.

use parking_lot::RwLock;
use rns_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Failures reported by a token ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("allowance of {spender} over {owner} is {allowance}, requested {requested}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowance: Amount,
        requested: Amount,
    },

    #[error("balance of {account} is {balance}, requested {requested}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        requested: Amount,
    },

    #[error("balance overflow crediting {account}")]
    Overflow { account: Address },
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Fungible-token allowance/transfer capability.
///
/// Every mutating call either applies in full or returns an error having
/// changed nothing.
pub trait TokenLedger: Send + Sync + fmt::Debug {
    /// Let `spender` pull up to `amount` from `owner`. Overwrites any previous
    /// allowance.
    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> LedgerResult<()>;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    fn balance_of(&self, account: &Address) -> Amount;

    /// Push `amount` from `from` to `to`.
    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()>;

    /// Pull `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()>;
}

/// A completed movement of funds, kept for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    history: Vec<TransferRecord>,
}

impl LedgerState {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn move_funds(&mut self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let from_balance = self.balance(from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                balance: from_balance,
                requested: amount,
            });
        }
        if from != to {
            let to_balance = self
                .balance(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow { account: *to })?;
            self.balances.insert(*from, from_balance - amount);
            self.balances.insert(*to, to_balance);
        }
        self.history.push(TransferRecord {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// In-memory implementation (for tooling and testing)
// -----------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens in `account`.
    pub fn mint(&self, account: &Address, amount: Amount) -> LedgerResult<()> {
        let mut state = self.state.write();
        let balance = state
            .balance(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *account })?;
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *account })?;
        state.balances.insert(*account, balance);
        state.total_supply = supply;
        Ok(())
    }

    pub fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    /// Every successful transfer, oldest first.
    pub fn history(&self) -> Vec<TransferRecord> {
        self.state.read().history.clone()
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> LedgerResult<()> {
        self.state
            .write()
            .allowances
            .insert((*owner, *spender), amount);
        Ok(())
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state
            .read()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.state.read().balance(account)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.state.write().move_funds(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        let mut state = self.state.write();
        let key = (*from, *spender);
        let allowance = state.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                allowance,
                requested: amount,
            });
        }

        state.move_funds(from, to, amount)?;
        state.allowances.insert(key, allowance - amount);
        Ok(())
    }
}
