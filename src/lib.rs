//! # Auction Kernel
//!
//! Single-asset, time-boxed ascending auction with escrowed bids.
//!
//! ## Architecture
//!
//! The kernel consists of:
//! - **Types**: Identities, amounts, phases, events, snapshots
//! - **Escrow**: Refund book of outbid balances
//! - **Engine**: The auction state machine and its serialized handle
//! - **Collaborators**: Clock, asset custody, funds sink, audit ledger
//!
//! ## Lifecycle
//!
//! 1. The seller constructs the auction with `(seller, asset, starting_bid, duration)`
//! 2. `start()` moves the asset into custody and fixes the deadline
//! 3. `bid()` / `withdraw()` while open; outbid amounts become refundable
//! 4. `end()` after the deadline hands the asset to the winner and the
//!    winning funds to the seller, exactly once
//!
//! ## Design Principles
//!
//! 1. **Conservation**: Escrowed funds always equal the leading bid plus refunds
//! 2. **Monotonic phases**: `Created → Started → Ended`, never back
//! 3. **Atomic operations**: A failed operation changes nothing
//! 4. **Injected collaborators**: No ambient clock, registry or wallet access

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: AccountId, AssetRef, Phase, AuctionEvent
pub mod types;

/// Refund accounting for outbid bidders
pub mod escrow;

/// Auction state machine
pub mod engine;

pub mod clock;
pub mod config;
pub mod custody;
pub mod error;
pub mod funds;
pub mod ledger;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuctionConfig;
pub use custody::{AssetCustody, InMemoryCustody};
pub use engine::{AuctionCore, SharedAuction};
pub use error::{AuctionError, ConfigError, CustodyError, TransferError};
pub use funds::{FundsSink, InMemoryFunds};
pub use ledger::{Ledger, MemoryLedger};
pub use types::{AccountId, Amount, AssetRef, AuctionEvent, Phase, SettlementReceipt, Timestamp};
