//! Funds movement primitive.
//!
//! Bids carry funds. [`FundsSink::collect`] pulls the funds attached to a
//! bid into the auction's escrow; [`FundsSink::send`] pays escrowed funds
//! out to an account (refunds and the seller's payout).

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::TransferError;
use crate::types::{AccountId, Amount};

/// Debit/credit primitive between accounts and the auction's escrow.
pub trait FundsSink {
    /// Move `amount` from `from` into escrow
    fn collect(&mut self, from: AccountId, amount: Amount) -> Result<(), TransferError>;

    /// Move `amount` out of escrow to `to`
    fn send(&mut self, to: AccountId, amount: Amount) -> Result<(), TransferError>;
}

/// Account balances kept in memory, plus the escrow balance.
///
/// ```
/// use auction_kernel::funds::{FundsSink, InMemoryFunds};
/// use auction_kernel::types::AccountId;
///
/// let mut funds = InMemoryFunds::new();
/// funds.deposit(AccountId(2), 500);
/// funds.collect(AccountId(2), 200).unwrap();
/// assert_eq!(funds.balance_of(AccountId(2)), 300);
/// assert_eq!(funds.escrow_balance(), 200);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryFunds {
    balances: HashMap<AccountId, Amount>,
    escrow: Amount,
    rejecting: HashSet<AccountId>,
}

impl InMemoryFunds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `account` spendable funds
    pub fn deposit(&mut self, account: AccountId, amount: Amount) {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.balances.get(&account).copied().unwrap_or(0)
    }

    /// Funds currently held by the auction
    pub fn escrow_balance(&self) -> Amount {
        self.escrow
    }

    /// Refuse every future `send` to `account`
    pub fn reject_sends_to(&mut self, account: AccountId) {
        self.rejecting.insert(account);
    }

    /// Accept sends to `account` again
    pub fn accept_sends_to(&mut self, account: AccountId) {
        self.rejecting.remove(&account);
    }
}

impl FundsSink for InMemoryFunds {
    fn collect(&mut self, from: AccountId, amount: Amount) -> Result<(), TransferError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TransferError::InsufficientFunds {
                account: from,
                needed: amount,
                available,
            });
        }

        self.balances.insert(from, available - amount);
        self.escrow += amount;
        debug!(%from, amount, "Funds collected into escrow");
        Ok(())
    }

    fn send(&mut self, to: AccountId, amount: Amount) -> Result<(), TransferError> {
        if self.rejecting.contains(&to) {
            return Err(TransferError::Rejected {
                account: to,
                reason: "recipient refuses funds".to_string(),
            });
        }
        if self.escrow < amount {
            return Err(TransferError::InsufficientFunds {
                account: to,
                needed: amount,
                available: self.escrow,
            });
        }

        self.escrow -= amount;
        self.deposit(to, amount);
        debug!(%to, amount, "Funds sent from escrow");
        Ok(())
    }
}
