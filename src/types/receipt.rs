//! Snapshot and settlement receipt.
//!
//! The [`AuctionSnapshot`] is a flat SSZ image of every mutable field of an
//! auction; its SHA-256 is the auction's state root. The
//! [`SettlementReceipt`] summarizes the one-time settlement and carries the
//! state root as of settlement.

use ssz_rs::prelude::*;
use sha2::{Digest, Sha256};

use crate::types::amount::Amount;
use crate::types::{AccountId, Phase, Timestamp};

/// Compute SHA-256 of the given data
pub fn compute_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

// ============================================================================
// AuctionSnapshot
// ============================================================================

/// Point-in-time image of an auction.
///
/// ## SSZ Layout
///
/// Fixed-size container of 1 + 1 + 8 * 14 = 114 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct AuctionSnapshot {
    /// Phase as u8 (0=Created, 1=Started, 2=Ended)
    pub phase_raw: u8,
    pub seller: u64,
    pub asset_collection: u64,
    pub asset_item: u64,
    pub starting_bid: u64,
    pub duration: u64,
    pub started_at: u64,
    pub end_at: u64,
    pub highest_bid: u64,
    /// Raw identity of the leader; meaningful only if `has_leader`
    pub highest_bidder: u64,
    pub has_leader: bool,
    /// Sum of all refundable balances
    pub refund_total: u64,
    /// Number of accounts holding a refundable balance
    pub refund_accounts: u64,
    pub total_collected: u64,
    pub total_released: u64,
    /// Number of events emitted so far
    pub event_count: u64,
}

impl AuctionSnapshot {
    /// Get the phase
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase_raw).unwrap_or_default()
    }

    /// Get the leader, if any
    pub fn leader(&self) -> Option<AccountId> {
        self.has_leader.then_some(AccountId(self.highest_bidder))
    }

    /// SHA-256 of the SSZ encoding
    ///
    /// Returns `None` only if the snapshot fails to encode.
    pub fn state_root(&self) -> Option<[u8; 32]> {
        let bytes = ssz_rs::serialize(self).ok()?;
        Some(compute_hash(&bytes))
    }
}

// ============================================================================
// SettlementReceipt
// ============================================================================

/// Proof of the single settlement of an auction.
///
/// ## Example
///
/// ```
/// use auction_kernel::types::{AccountId, SettlementReceipt};
///
/// let receipt = SettlementReceipt::new(Some(AccountId(2)), 800, AccountId(1), 160, [0u8; 32]);
/// assert!(receipt.has_winner());
/// assert_eq!(receipt.state_root_hex().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct SettlementReceipt {
    /// Raw winner identity, 0 when nobody bid
    pub winner: u64,

    /// Whether a winner exists
    pub has_winner: bool,

    /// Winning amount (the starting bid if nobody bid)
    pub amount: u64,

    /// Seller identity
    pub seller: u64,

    /// Clock time of settlement
    pub settled_at: u64,

    /// Seller payout was refused and credited as a refundable balance
    pub payout_deferred: bool,

    /// State root right after settlement
    pub state_root: [u8; 32],
}

impl SettlementReceipt {
    pub fn new(
        winner: Option<AccountId>,
        amount: Amount,
        seller: AccountId,
        settled_at: Timestamp,
        state_root: [u8; 32],
    ) -> Self {
        Self {
            winner: winner.map(AccountId::raw).unwrap_or(0),
            has_winner: winner.is_some(),
            amount,
            seller: seller.raw(),
            settled_at,
            payout_deferred: false,
            state_root,
        }
    }

    /// Mark the seller payout as deferred to `withdraw`
    pub fn with_deferred_payout(mut self) -> Self {
        self.payout_deferred = true;
        self
    }

    pub fn has_winner(&self) -> bool {
        self.has_winner
    }

    /// Get the winner, if any
    pub fn winner(&self) -> Option<AccountId> {
        self.has_winner.then_some(AccountId(self.winner))
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_determinism() {
        assert_eq!(compute_hash(b"bid"), compute_hash(b"bid"));
        assert_ne!(compute_hash(b"bid"), compute_hash(b"withdraw"));
    }

    #[test]
    fn test_snapshot_root_changes_with_state() {
        let mut snapshot = AuctionSnapshot {
            phase_raw: Phase::Started.to_u8(),
            highest_bid: 200,
            ..AuctionSnapshot::default()
        };
        let before = snapshot.state_root().expect("root");

        snapshot.highest_bid = 800;
        let after = snapshot.state_root().expect("root");

        assert_ne!(before, after);
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = AuctionSnapshot {
            phase_raw: 2,
            highest_bidder: 9,
            has_leader: true,
            ..AuctionSnapshot::default()
        };
        assert_eq!(snapshot.phase(), Phase::Ended);
        assert_eq!(snapshot.leader(), Some(AccountId(9)));
        assert_eq!(AuctionSnapshot::default().leader(), None);
    }

    #[test]
    fn test_snapshot_ssz_size() {
        let bytes = ssz_rs::serialize(&AuctionSnapshot::default()).expect("Failed to serialize");
        assert_eq!(bytes.len(), 114);
    }

    #[test]
    fn test_receipt_without_winner() {
        let receipt = SettlementReceipt::new(None, 1, AccountId(1), 60, [0xAB; 32]);
        assert!(!receipt.has_winner());
        assert_eq!(receipt.winner(), None);
        assert_eq!(receipt.state_root_hex(), "ab".repeat(32));
        assert!(!receipt.payout_deferred);
    }

    #[test]
    fn test_receipt_deferred_payout() {
        let receipt = SettlementReceipt::new(Some(AccountId(2)), 200, AccountId(1), 60, [0u8; 32]);
        let deferred = receipt.clone().with_deferred_payout();

        assert!(deferred.payout_deferred);
        assert_eq!(deferred.amount, receipt.amount);
        assert_ne!(deferred, receipt);
    }

    #[test]
    fn test_receipt_ssz_size() {
        let receipt = SettlementReceipt::default();
        let bytes = ssz_rs::serialize(&receipt).expect("Failed to serialize");

        // 8 + 1 + 8 + 8 + 8 + 1 + 32
        assert_eq!(bytes.len(), 66);
    }
}
