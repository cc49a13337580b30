//! Append-only audit ledger.
//!
//! The auction appends every emitted event here as an [`EventRecord`]. The
//! ledger is a sink, never a source of truth: append failures are logged
//! and ignored by the auction.
//!
//! [`MemoryLedger`] hash-chains the records:
//! `hash_n = sha256(domain || hash_{n-1} || ssz(record_n))`, genesis is zero.

use std::sync::{Arc, Mutex};

use crate::error::LedgerError;
use crate::types::{compute_hash, AuctionEvent, EventRecord};

/// Domain tag for ledger entry hashing (v1).
pub const LEDGER_ENTRY_DOMAIN_V1: &[u8] = b"AUCTION_KERNEL_LEDGER_ENTRY_V1";

/// Audit sink for auction events.
pub trait Ledger {
    fn append(&mut self, record: &EventRecord) -> Result<(), LedgerError>;
}

/// One chained ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub record: EventRecord,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

/// Compute the chained hash of one entry.
pub fn entry_hash_v1(prev_hash: &[u8; 32], record: &EventRecord) -> Result<[u8; 32], LedgerError> {
    let encoded = ssz_rs::serialize(record).map_err(|e| LedgerError::Encode(format!("{e:?}")))?;

    let mut bytes = Vec::with_capacity(LEDGER_ENTRY_DOMAIN_V1.len() + 32 + encoded.len());
    bytes.extend_from_slice(LEDGER_ENTRY_DOMAIN_V1);
    bytes.extend_from_slice(prev_hash);
    bytes.extend_from_slice(&encoded);
    Ok(compute_hash(&bytes))
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    head: [u8; 32],
}

/// Hash-chained in-memory ledger.
///
/// Clones share the same entries, so a caller can keep a handle after
/// attaching the ledger to an auction.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hash of the latest entry (zero when empty)
    pub fn head(&self) -> [u8; 32] {
        self.state.lock().map(|s| s.head).unwrap_or([0u8; 32])
    }

    pub fn head_hex(&self) -> String {
        hex::encode(self.head())
    }

    /// Copy of all entries, oldest first
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.state.lock().map(|s| s.entries.clone()).unwrap_or_default()
    }

    /// Decode the recorded events, oldest first; malformed records are skipped
    pub fn replay(&self) -> Vec<AuctionEvent> {
        self.entries().iter().filter_map(|e| e.record.event()).collect()
    }

    /// Recompute the whole chain and compare with the stored hashes
    pub fn verify(&self) -> bool {
        let Ok(state) = self.state.lock() else {
            return false;
        };

        let mut prev = [0u8; 32];
        for entry in &state.entries {
            if entry.prev_hash != prev {
                return false;
            }
            match entry_hash_v1(&prev, &entry.record) {
                Ok(hash) if hash == entry.hash => prev = hash,
                _ => return false,
            }
        }
        prev == state.head
    }
}

impl Ledger for MemoryLedger {
    fn append(&mut self, record: &EventRecord) -> Result<(), LedgerError> {
        let mut state = self.state.lock().map_err(|_| LedgerError::Poisoned)?;

        let prev_hash = state.head;
        let hash = entry_hash_v1(&prev_hash, record)?;
        state.entries.push(LedgerEntry {
            record: record.clone(),
            prev_hash,
            hash,
        });
        state.head = hash;
        Ok(())
    }
}
