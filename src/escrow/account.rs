//! Refund account stored in the refund book's slab.

use crate::types::{AccountId, Amount, Timestamp};

/// Refundable balance owed to one bidder.
///
/// A bidder gets an account the first time they are outbid. Each later
/// outbid adds to the same balance until they withdraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundAccount {
    /// Owner of the balance
    pub account: AccountId,

    /// Amount currently withdrawable
    pub balance: Amount,

    /// How many credits went into this balance since it was last emptied
    pub credits: u32,

    /// Clock time of the latest credit
    pub last_credited_at: Timestamp,
}

impl RefundAccount {
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            balance: 0,
            credits: 0,
            last_credited_at: 0,
        }
    }

    /// Add `amount`; `None` on overflow, leaving the account untouched
    pub fn credit(&mut self, amount: Amount, at: Timestamp) -> Option<Amount> {
        self.balance = self.balance.checked_add(amount)?;
        self.credits = self.credits.saturating_add(1);
        self.last_credited_at = at;
        Some(self.balance)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.balance == 0
    }
}
