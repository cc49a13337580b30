//! Auction lifecycle phase.

use std::fmt;

/// Lifecycle phase: `Created → Started → Ended`, never backwards.
///
/// Represented as u8 for SSZ compatibility:
/// - Created = 0
/// - Started = 1
/// - Ended = 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Phase {
    /// Constructed; asset not yet in custody, bidding closed
    #[default]
    Created,
    /// Asset in custody, bidding open until the deadline
    Started,
    /// Settled; terminal
    Ended,
}

impl Phase {
    /// Convert to u8 for serialization
    pub fn to_u8(self) -> u8 {
        match self {
            Phase::Created => 0,
            Phase::Started => 1,
            Phase::Ended => 2,
        }
    }

    /// Convert from u8 for deserialization
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Phase::Created),
            1 => Some(Phase::Started),
            2 => Some(Phase::Ended),
            _ => None,
        }
    }

    /// The only phase reachable from this one, if any
    pub fn next(self) -> Option<Self> {
        match self {
            Phase::Created => Some(Phase::Started),
            Phase::Started => Some(Phase::Ended),
            Phase::Ended => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Ended
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Created => "created",
            Phase::Started => "started",
            Phase::Ended => "ended",
        };
        f.write_str(name)
    }
}
