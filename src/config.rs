//! Construction parameters.

use crate::error::ConfigError;
use crate::types::amount::to_fixed;
use crate::types::{AccountId, Amount, AssetRef};

/// Refund accounts pre-allocated when no capacity is given
pub const DEFAULT_REFUND_CAPACITY: usize = 64;

/// Everything fixed at construction time.
///
/// ## Example
///
/// ```
/// use auction_kernel::config::AuctionConfig;
/// use auction_kernel::types::{AccountId, AssetRef};
///
/// let config = AuctionConfig::new(AccountId(1), AssetRef::new(7, 1), 0, 60)
///     .with_starting_bid_str("0.001")
///     .unwrap();
///
/// assert_eq!(config.starting_bid, 100_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionConfig {
    /// Only identity allowed to start the auction; receives the winning funds
    pub seller: AccountId,

    /// Asset placed into custody at start
    pub asset: AssetRef,

    /// The first bid must strictly exceed this
    pub starting_bid: Amount,

    /// Bidding window in seconds, counted from start
    pub duration: u64,

    /// Refund accounts to pre-allocate
    pub refund_capacity: usize,
}

impl AuctionConfig {
    pub fn new(seller: AccountId, asset: AssetRef, starting_bid: Amount, duration: u64) -> Self {
        Self {
            seller,
            asset,
            starting_bid,
            duration,
            refund_capacity: DEFAULT_REFUND_CAPACITY,
        }
    }

    pub fn with_refund_capacity(mut self, capacity: usize) -> Self {
        self.refund_capacity = capacity;
        self
    }

    /// Set the starting bid from a decimal string (e.g. `"0.001"`)
    pub fn with_starting_bid_str(mut self, s: &str) -> Result<Self, ConfigError> {
        self.starting_bid = to_fixed(s).ok_or_else(|| ConfigError::InvalidAmount(s.to_string()))?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(())
    }
}
