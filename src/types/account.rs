//! Identities and asset references.

use std::fmt;

/// Identity of a participant (seller or bidder).
///
/// Stored as a raw `u64` so it encodes directly into SSZ records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId(pub u64);

impl AccountId {
    /// Raw value for serialization
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for AccountId {
    fn from(value: u64) -> Self {
        AccountId(value)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

/// Opaque reference to the auctioned asset: collection plus item within it.
///
/// ## Example
///
/// ```
/// use auction_kernel::types::AssetRef;
///
/// let asset = AssetRef::new(7, 1);
/// assert_eq!(asset.to_string(), "7#1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AssetRef {
    /// Asset collection (registry/contract) identifier
    pub collection: u64,

    /// Item identifier within the collection
    pub item: u64,
}

impl AssetRef {
    pub fn new(collection: u64, item: u64) -> Self {
        Self { collection, item }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.collection, self.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_display() {
        assert_eq!(AccountId(0xab).to_string(), "0x00000000000000ab");
        assert_eq!(AccountId::from(5).raw(), 5);
    }

    #[test]
    fn test_asset_display() {
        assert_eq!(AssetRef::new(3, 42).to_string(), "3#42");
    }
}
