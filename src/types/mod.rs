//! Core data types for the auction kernel
//!
//! All amounts are `u64` base units (see [`amount`]); all times are `u64`
//! seconds from the injected clock.
//!
//! ## Types
//!
//! - [`AccountId`]: Seller or bidder identity
//! - [`AssetRef`]: The auctioned asset (collection + item)
//! - [`Phase`]: Lifecycle phase
//! - [`AuctionEvent`] / [`EventRecord`]: Emitted events, typed and SSZ form
//! - [`AuctionSnapshot`] / [`SettlementReceipt`]: State images for audit

mod account;
mod event;
mod phase;
mod receipt;
pub mod amount;

pub use account::{AccountId, AssetRef};
pub use amount::Amount;
pub use event::{AuctionEvent, EventKind, EventRecord};
pub use phase::Phase;
pub use receipt::{compute_hash, AuctionSnapshot, SettlementReceipt};

/// Seconds, as reported by a [`crate::clock::Clock`]
pub type Timestamp = u64;
