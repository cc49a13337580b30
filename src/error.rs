//! Error taxonomy.
//!
//! Every failure is a local validation failure returned to the caller. A
//! failed operation leaves the auction exactly as it was.

use thiserror::Error;

use crate::types::{AccountId, Amount, AssetRef, Phase, Timestamp};

/// Result alias for auction operations
pub type Result<T> = std::result::Result<T, AuctionError>;

/// Failure of an auction operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("caller {caller} is not the seller")]
    Unauthorized { caller: AccountId },

    #[error("cannot {operation} an auction in phase {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    #[error("auction is not accepting bids (not started)")]
    AuctionNotStarted,

    #[error("auction expired at {end_at}")]
    AuctionExpired { end_at: Timestamp },

    #[error("auction is open until {end_at}")]
    AuctionStillOpen { end_at: Timestamp },

    #[error("bid {amount} too low: must exceed {highest_bid}")]
    BidTooLow { amount: Amount, highest_bid: Amount },

    #[error("no refund available for {account}")]
    NoRefundAvailable { account: AccountId },

    #[error("custody: {0}")]
    Custody(#[from] CustodyError),

    #[error("transfer: {0}")]
    Transfer(#[from] TransferError),

    #[error("amount overflow")]
    AmountOverflow,

    #[error("deadline overflows the clock range")]
    TimestampOverflow,

    #[error("re-entrant call into auction")]
    Reentrant,

    #[error("auction lock poisoned")]
    LockPoisoned,
}

/// Failure reported by an asset custody provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("{caller} does not own asset {asset}")]
    NotOwner { asset: AssetRef, caller: AccountId },

    #[error("auction not approved to move asset {asset}")]
    NotApproved { asset: AssetRef },

    #[error("asset {asset} is not held in custody")]
    NotInCustody { asset: AssetRef },

    #[error("custody unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a funds sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("{account} has {available}, needs {needed}")]
    InsufficientFunds {
        account: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("transfer to {account} rejected: {reason}")]
    Rejected { account: AccountId, reason: String },
}

/// Invalid construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("auction duration must be greater than zero")]
    ZeroDuration,

    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),
}

/// Escrowed funds do not match the leading bid plus refundable balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("escrow holds {held} but owes {owed}")]
pub struct EscrowMismatch {
    pub held: Amount,
    pub owed: Amount,
}

/// Failure of the audit ledger. Never affects auction state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("failed to encode record: {0}")]
    Encode(String),

    #[error("ledger lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AuctionError::BidTooLow { amount: 800, highest_bid: 800 };
        assert_eq!(err.to_string(), "bid 800 too low: must exceed 800");

        let err = AuctionError::InvalidPhase { operation: "end", phase: Phase::Ended };
        assert_eq!(err.to_string(), "cannot end an auction in phase ended");
    }

    #[test]
    fn test_custody_error_converts() {
        let asset = AssetRef::new(1, 1);
        let err: AuctionError = CustodyError::NotApproved { asset }.into();
        assert_eq!(err, AuctionError::Custody(CustodyError::NotApproved { asset }));
        assert_eq!(err.to_string(), "custody: auction not approved to move asset 1#1");
    }
}
