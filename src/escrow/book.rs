//! Refund book: the explicit `bidder → refundable balance` ledger.
//!
//! ## Architecture
//!
//! - **Slab**: Pre-allocated storage for refund accounts
//! - **HashMap**: Account ID to slab key mapping for O(1) lookup
//! - **Running total**: Sum of all balances, kept in step with every change
//!
//! An account is removed from the slab when its balance drops to zero, so
//! the book only ever holds accounts that are owed something. Slab keys are
//! reused after removal.
//!
//! ## Example
//!
//! ```
//! use auction_kernel::escrow::RefundBook;
//! use auction_kernel::types::AccountId;
//!
//! let mut book = RefundBook::with_capacity(16);
//! book.credit(AccountId(2), 200, 0).unwrap();
//! book.credit(AccountId(2), 300, 5).unwrap();
//!
//! assert_eq!(book.balance_of(AccountId(2)), 500);
//! assert_eq!(book.take(AccountId(2)), 500);
//! assert_eq!(book.balance_of(AccountId(2)), 0);
//! assert!(book.is_empty());
//! ```

use std::collections::HashMap;

use slab::Slab;

use crate::error::{AuctionError, Result};
use crate::escrow::RefundAccount;
use crate::types::{AccountId, Amount, Timestamp};

/// Refundable balances of every bidder who is owed funds.
#[derive(Debug, Default)]
pub struct RefundBook {
    /// Key: slab index, Value: RefundAccount
    accounts: Slab<RefundAccount>,

    /// Account ID to slab key mapping
    index: HashMap<AccountId, usize>,

    /// Sum of all balances
    total: Amount,
}

impl RefundBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            accounts: Slab::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            total: 0,
        }
    }

    // ========================================================================
    // Size
    // ========================================================================

    #[inline]
    pub fn capacity(&self) -> usize {
        self.accounts.capacity()
    }

    /// Number of accounts owed a refund
    #[inline]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all refundable balances
    #[inline]
    pub fn total(&self) -> Amount {
        self.total
    }

    // ========================================================================
    // Balances
    // ========================================================================

    /// Refundable balance of `account` (0 if none)
    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.get(account).map(|a| a.balance).unwrap_or(0)
    }

    pub fn get(&self, account: AccountId) -> Option<&RefundAccount> {
        let key = *self.index.get(&account)?;
        self.accounts.get(key)
    }

    /// Add `amount` to the balance of `account`, creating its entry if needed
    ///
    /// Returns the new balance. On overflow nothing changes.
    pub fn credit(&mut self, account: AccountId, amount: Amount, at: Timestamp) -> Result<Amount> {
        if amount == 0 {
            return Ok(self.balance_of(account));
        }

        let total = self.total.checked_add(amount).ok_or(AuctionError::AmountOverflow)?;

        let balance = match self.index.get(&account).copied() {
            Some(key) => self.accounts[key]
                .credit(amount, at)
                .ok_or(AuctionError::AmountOverflow)?,
            None => {
                let mut entry = RefundAccount::new(account);
                let balance = entry.credit(amount, at).ok_or(AuctionError::AmountOverflow)?;
                let key = self.accounts.insert(entry);
                self.index.insert(account, key);
                balance
            }
        };

        self.total = total;
        Ok(balance)
    }

    /// Zero the balance of `account` and return what it was
    pub fn take(&mut self, account: AccountId) -> Amount {
        self.take_entry(account).map(|e| e.balance).unwrap_or(0)
    }

    /// Remove the whole entry of `account`
    pub fn take_entry(&mut self, account: AccountId) -> Option<RefundAccount> {
        let key = self.index.remove(&account)?;
        let entry = self.accounts.remove(key);
        self.total -= entry.balance;
        Some(entry)
    }

    /// Put back an entry removed by [`take_entry`](Self::take_entry)
    ///
    /// Merges into an existing entry if one was created meanwhile.
    pub fn restore(&mut self, entry: RefundAccount) -> Result<()> {
        let total = self
            .total
            .checked_add(entry.balance)
            .ok_or(AuctionError::AmountOverflow)?;

        match self.index.get(&entry.account).copied() {
            Some(key) => {
                let existing = &mut self.accounts[key];
                existing.balance = existing
                    .balance
                    .checked_add(entry.balance)
                    .ok_or(AuctionError::AmountOverflow)?;
                existing.credits = existing.credits.saturating_add(entry.credits);
            }
            None => {
                let account = entry.account;
                let key = self.accounts.insert(entry);
                self.index.insert(account, key);
            }
        }

        self.total = total;
        Ok(())
    }

    /// Set the entry of `account` back to `prior`, undoing every change since
    pub fn reset(&mut self, account: AccountId, prior: Option<RefundAccount>) -> Result<()> {
        self.take_entry(account);
        match prior {
            Some(entry) => self.restore(entry),
            None => Ok(()),
        }
    }

    /// Iterate over all accounts owed a refund (slab order)
    pub fn iter(&self) -> impl Iterator<Item = &RefundAccount> {
        self.accounts.iter().map(|(_, a)| a)
    }

    /// Recompute the total from the entries
    pub fn recomputed_total(&self) -> Option<Amount> {
        self.iter().try_fold(0u64, |acc, a| acc.checked_add(a.balance))
    }
}
