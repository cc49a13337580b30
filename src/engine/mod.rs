//! Auction engine for the auction kernel.
//!
//! ## Design Principles
//!
//! 1. **Serial**: One operation at a time per auction, each run to completion
//! 2. **Commit before calling out**: State is updated before any custody or
//!    funds call, and restored if that call fails
//! 3. **Explicit escrow**: Refunds live in a ledger whose total is checked,
//!    not inferred from an external balance
//! 4. **Exactly-once settlement**: `end()` succeeds at most once
//!
//! ## Bidding Rules
//!
//! - A bid must strictly exceed the highest bid (the first one must exceed
//!   the starting bid)
//! - Bids are accepted while `now < end_at`
//! - An outbid leader's amount becomes refundable, accumulating across outbids
//! - A leader raising their own bid names a new total and adds the difference
//!
//! ## Example
//!
//! ```
//! use auction_kernel::clock::ManualClock;
//! use auction_kernel::config::AuctionConfig;
//! use auction_kernel::custody::InMemoryCustody;
//! use auction_kernel::engine::AuctionCore;
//! use auction_kernel::funds::InMemoryFunds;
//! use auction_kernel::types::{AccountId, AssetRef};
//!
//! let (seller, asset) = (AccountId(1), AssetRef::new(1, 1));
//! let (u1, u2) = (AccountId(2), AccountId(3));
//!
//! let mut custody = InMemoryCustody::new();
//! custody.mint(asset, seller);
//! custody.approve(asset, seller);
//! let mut funds = InMemoryFunds::new();
//! funds.deposit(u1, 1_000);
//! funds.deposit(u2, 1_000);
//!
//! let config = AuctionConfig::new(seller, asset, 1, 60);
//! let mut auction = AuctionCore::new(config, ManualClock::new(0), custody, funds).unwrap();
//! auction.start(seller).unwrap();
//!
//! auction.bid(u1, 200).unwrap();
//! auction.bid(u2, 800).unwrap();
//! assert_eq!(auction.refund_of(u1), 200);
//!
//! assert_eq!(auction.withdraw(u1).unwrap(), 200);
//! assert!(auction.withdraw(u1).is_err());
//! ```

pub mod auction;
pub mod shared;

pub use auction::AuctionCore;
pub use shared::SharedAuction;
