//! Asset custody capability.
//!
//! The auction never owns an asset registry. It is handed an
//! [`AssetCustody`] implementation that can move the asset into escrow at
//! start and release it at settlement.
//!
//! [`InMemoryCustody`] is an ownership registry with per-asset approvals:
//! taking custody requires the giver to own the asset and to have approved
//! the auction as operator beforehand.

use std::collections::HashMap;

use tracing::debug;

use crate::error::CustodyError;
use crate::types::{AccountId, AssetRef};

/// Capability to hold and release the auctioned asset.
pub trait AssetCustody {
    /// Move `asset` from `from` into escrow under the auction's control
    fn take_custody(&mut self, asset: AssetRef, from: AccountId) -> Result<(), CustodyError>;

    /// Release `asset` from escrow to `recipient`
    fn transfer_to(&mut self, asset: AssetRef, recipient: AccountId) -> Result<(), CustodyError>;
}

/// Holder of an asset in [`InMemoryCustody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    Account(AccountId),
    Escrow,
}

/// Ownership registry kept in memory.
///
/// ## Example
///
/// ```
/// use auction_kernel::custody::{AssetCustody, Holder, InMemoryCustody};
/// use auction_kernel::types::{AccountId, AssetRef};
///
/// let asset = AssetRef::new(1, 1);
/// let seller = AccountId(1);
///
/// let mut custody = InMemoryCustody::new();
/// custody.mint(asset, seller);
/// assert!(custody.take_custody(asset, seller).is_err()); // not approved
///
/// custody.approve(asset, seller);
/// custody.take_custody(asset, seller).unwrap();
/// assert_eq!(custody.holder_of(asset), Some(Holder::Escrow));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustody {
    holders: HashMap<AssetRef, Holder>,
    approvals: HashMap<AssetRef, AccountId>,
    fail_next_transfer: bool,
    transfers: usize,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `asset` as owned by `owner`
    pub fn mint(&mut self, asset: AssetRef, owner: AccountId) {
        self.holders.insert(asset, Holder::Account(owner));
    }

    /// Record that `owner` lets the auction move `asset`
    pub fn approve(&mut self, asset: AssetRef, owner: AccountId) {
        self.approvals.insert(asset, owner);
    }

    pub fn holder_of(&self, asset: AssetRef) -> Option<Holder> {
        self.holders.get(&asset).copied()
    }

    /// Account owning `asset`, `None` while in escrow or unknown
    pub fn owner_of(&self, asset: AssetRef) -> Option<AccountId> {
        match self.holder_of(asset)? {
            Holder::Account(owner) => Some(owner),
            Holder::Escrow => None,
        }
    }

    pub fn is_in_custody(&self, asset: AssetRef) -> bool {
        self.holder_of(asset) == Some(Holder::Escrow)
    }

    /// Make the next `transfer_to` fail with `Unavailable`
    pub fn fail_next_transfer(&mut self) {
        self.fail_next_transfer = true;
    }

    /// Number of successful releases from escrow
    pub fn transfer_count(&self) -> usize {
        self.transfers
    }
}

impl AssetCustody for InMemoryCustody {
    fn take_custody(&mut self, asset: AssetRef, from: AccountId) -> Result<(), CustodyError> {
        if self.holder_of(asset) != Some(Holder::Account(from)) {
            return Err(CustodyError::NotOwner { asset, caller: from });
        }
        if self.approvals.get(&asset) != Some(&from) {
            return Err(CustodyError::NotApproved { asset });
        }

        // Approval is consumed by the move, like an ERC-721 transfer clears it
        self.approvals.remove(&asset);
        self.holders.insert(asset, Holder::Escrow);
        debug!(%asset, %from, "Asset moved into escrow");
        Ok(())
    }

    fn transfer_to(&mut self, asset: AssetRef, recipient: AccountId) -> Result<(), CustodyError> {
        if std::mem::take(&mut self.fail_next_transfer) {
            return Err(CustodyError::Unavailable("injected failure".to_string()));
        }
        if !self.is_in_custody(asset) {
            return Err(CustodyError::NotInCustody { asset });
        }

        self.holders.insert(asset, Holder::Account(recipient));
        self.transfers += 1;
        debug!(%asset, %recipient, "Asset released from escrow");
        Ok(())
    }
}
