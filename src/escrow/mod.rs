//! Escrow accounting for losing bids.
//!
//! ## Components
//!
//! - [`RefundAccount`]: One bidder's refundable balance
//! - [`RefundBook`]: All refundable balances, slab-backed, with a running total
//!
//! The leading bid is not in the book: it is held by the auction itself
//! until it is either outbid (then credited here) or paid to the seller.

pub mod account;
pub mod book;

pub use account::RefundAccount;
pub use book::RefundBook;
