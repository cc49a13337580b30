//! Domain events emitted by the auction.
//!
//! ## SSZ Serialization
//!
//! [`AuctionEvent`] is the typed form handed to listeners. [`EventRecord`] is
//! its flat, fixed-size SSZ container used by the audit ledger, so that the
//! same event always hashes to the same bytes.

use std::fmt;

use ssz_rs::prelude::*;

use crate::types::amount::{from_fixed_trimmed, Amount};
use crate::types::{AccountId, Timestamp};

// ============================================================================
// AuctionEvent
// ============================================================================

/// Observable state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionEvent {
    /// Bidding opened; the deadline is fixed from here on
    Started {
        started_at: Timestamp,
        end_at: Timestamp,
    },
    /// A bid became the leading bid
    BidPlaced {
        bidder: AccountId,
        amount: Amount,
    },
    /// A refundable balance was paid out
    WithdrawMade {
        bidder: AccountId,
        amount: Amount,
    },
    /// Settlement done; `winner` is `None` when nobody bid
    Ended {
        winner: Option<AccountId>,
        amount: Amount,
    },
}

impl AuctionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            AuctionEvent::Started { .. } => EventKind::Started,
            AuctionEvent::BidPlaced { .. } => EventKind::BidPlaced,
            AuctionEvent::WithdrawMade { .. } => EventKind::WithdrawMade,
            AuctionEvent::Ended { .. } => EventKind::Ended,
        }
    }
}

impl fmt::Display for AuctionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionEvent::Started { started_at, end_at } => {
                write!(f, "Started(at={started_at}, ends={end_at})")
            }
            AuctionEvent::BidPlaced { bidder, amount } => {
                write!(f, "BidPlaced({bidder}, {})", from_fixed_trimmed(*amount))
            }
            AuctionEvent::WithdrawMade { bidder, amount } => {
                write!(f, "WithdrawMade({bidder}, {})", from_fixed_trimmed(*amount))
            }
            AuctionEvent::Ended { winner: Some(w), amount } => {
                write!(f, "Ended({w}, {})", from_fixed_trimmed(*amount))
            }
            AuctionEvent::Ended { winner: None, amount } => {
                write!(f, "Ended(no winner, {})", from_fixed_trimmed(*amount))
            }
        }
    }
}

// ============================================================================
// EventKind
// ============================================================================

/// Event discriminant, stored as u8 in [`EventRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Started,
    BidPlaced,
    WithdrawMade,
    Ended,
}

impl EventKind {
    pub fn to_u8(self) -> u8 {
        match self {
            EventKind::Started => 0,
            EventKind::BidPlaced => 1,
            EventKind::WithdrawMade => 2,
            EventKind::Ended => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(EventKind::Started),
            1 => Some(EventKind::BidPlaced),
            2 => Some(EventKind::WithdrawMade),
            3 => Some(EventKind::Ended),
            _ => None,
        }
    }
}

// ============================================================================
// EventRecord
// ============================================================================

/// Flat SSZ form of an event, as appended to the audit ledger.
///
/// ## Field usage per kind
///
/// | kind         | account | amount | aux     |
/// |--------------|---------|--------|---------|
/// | Started      | -       | -      | end_at (started_at in `timestamp`) |
/// | BidPlaced    | bidder  | bid    | -       |
/// | WithdrawMade | bidder  | refund | -       |
/// | Ended        | winner? | amount | -       |
///
/// ## SSZ Layout
///
/// Fixed-size container: 8+1+8+1+8+8+8 = 42 bytes
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct EventRecord {
    /// Position in the auction's event stream, starting at 1
    pub sequence: u64,

    /// Event kind as u8
    pub kind_raw: u8,

    /// Account involved (raw `AccountId`), 0 when `has_account` is false
    pub account: u64,

    /// Whether `account` is meaningful
    pub has_account: bool,

    /// Amount involved
    pub amount: u64,

    /// Kind-specific extra value
    pub aux: u64,

    /// Clock time when the event was emitted
    pub timestamp: u64,
}

impl EventRecord {
    /// Flatten an event
    pub fn from_event(sequence: u64, event: &AuctionEvent, timestamp: Timestamp) -> Self {
        let mut record = Self {
            sequence,
            kind_raw: event.kind().to_u8(),
            timestamp,
            ..Self::default()
        };

        match *event {
            AuctionEvent::Started { started_at, end_at } => {
                record.timestamp = started_at;
                record.aux = end_at;
            }
            AuctionEvent::BidPlaced { bidder, amount }
            | AuctionEvent::WithdrawMade { bidder, amount } => {
                record.account = bidder.raw();
                record.has_account = true;
                record.amount = amount;
            }
            AuctionEvent::Ended { winner, amount } => {
                if let Some(winner) = winner {
                    record.account = winner.raw();
                    record.has_account = true;
                }
                record.amount = amount;
            }
        }

        record
    }

    /// Get the event kind
    pub fn kind(&self) -> Option<EventKind> {
        EventKind::from_u8(self.kind_raw)
    }

    /// Rebuild the typed event, `None` if the record is malformed
    pub fn event(&self) -> Option<AuctionEvent> {
        let account = self.has_account.then_some(AccountId(self.account));
        let event = match self.kind()? {
            EventKind::Started => AuctionEvent::Started {
                started_at: self.timestamp,
                end_at: self.aux,
            },
            EventKind::BidPlaced => AuctionEvent::BidPlaced {
                bidder: account?,
                amount: self.amount,
            },
            EventKind::WithdrawMade => AuctionEvent::WithdrawMade {
                bidder: account?,
                amount: self.amount,
            },
            EventKind::Ended => AuctionEvent::Ended {
                winner: account,
                amount: self.amount,
            },
        };
        Some(event)
    }
}
