//! Thread-safe handle that serializes operations on one auction.
//!
//! Each operation holds the auction's mutex from validation through every
//! collaborator call, so operations never interleave. Bids are admitted in
//! lock acquisition order.
//!
//! A collaborator that calls back into the same handle while an operation
//! is running on its thread gets [`AuctionError::Reentrant`] instead of
//! deadlocking on the mutex. Calls made from other threads are not
//! detected and simply wait for the lock.

use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use tracing::warn;

use crate::clock::Clock;
use crate::custody::AssetCustody;
use crate::engine::AuctionCore;
use crate::error::{AuctionError, Result};
use crate::funds::FundsSink;
use crate::types::{AccountId, Amount, AuctionSnapshot, SettlementReceipt};

struct Shared<C, A, F> {
    core: Mutex<AuctionCore<C, A, F>>,
    /// Thread currently running an operation, if any
    holder: Mutex<Option<ThreadId>>,
}

/// Cloneable, `Send + Sync` handle to one auction.
///
/// Re-entrancy is detected per thread. A collaborator that hands the
/// handle to another thread and waits on it from inside an operation
/// blocks on the auction's mutex and deadlocks; only same-thread calls
/// get [`AuctionError::Reentrant`].
///
/// ```
/// use auction_kernel::clock::ManualClock;
/// use auction_kernel::config::AuctionConfig;
/// use auction_kernel::custody::InMemoryCustody;
/// use auction_kernel::engine::{AuctionCore, SharedAuction};
/// use auction_kernel::funds::InMemoryFunds;
/// use auction_kernel::types::{AccountId, AssetRef};
///
/// let (seller, asset) = (AccountId(1), AssetRef::new(1, 1));
/// let mut custody = InMemoryCustody::new();
/// custody.mint(asset, seller);
/// custody.approve(asset, seller);
///
/// let config = AuctionConfig::new(seller, asset, 1, 60);
/// let funds = InMemoryFunds::new();
/// let core = AuctionCore::new(config, ManualClock::new(0), custody, funds).unwrap();
/// let auction = SharedAuction::new(core);
///
/// auction.start(seller).unwrap();
/// let phase = auction.inspect(|core| core.phase()).unwrap();
/// assert_eq!(phase.to_string(), "started");
/// ```
pub struct SharedAuction<C, A, F> {
    inner: Arc<Shared<C, A, F>>,
}

impl<C, A, F> Clone for SharedAuction<C, A, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Clears the holder when the operation finishes, even by unwinding.
struct HolderGuard<'a>(&'a Mutex<Option<ThreadId>>);

impl Drop for HolderGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut holder) = self.0.lock() {
            *holder = None;
        }
    }
}

impl<C, A, F> SharedAuction<C, A, F> {
    pub fn new(core: AuctionCore<C, A, F>) -> Self {
        Self {
            inner: Arc::new(Shared {
                core: Mutex::new(core),
                holder: Mutex::new(None),
            }),
        }
    }

    /// Run `op` with exclusive access to the auction
    fn with_core<T>(&self, op: impl FnOnce(&mut AuctionCore<C, A, F>) -> Result<T>) -> Result<T> {
        let me = thread::current().id();
        {
            let holder = self.inner.holder.lock().map_err(|_| AuctionError::LockPoisoned)?;
            if *holder == Some(me) {
                warn!("Re-entrant call into auction rejected");
                return Err(AuctionError::Reentrant);
            }
        }

        let mut core = self.inner.core.lock().map_err(|_| AuctionError::LockPoisoned)?;
        *self.inner.holder.lock().map_err(|_| AuctionError::LockPoisoned)? = Some(me);
        let _guard = HolderGuard(&self.inner.holder);

        op(&mut core)
    }

    /// Read the auction under the lock
    pub fn inspect<T>(&self, read: impl FnOnce(&AuctionCore<C, A, F>) -> T) -> Result<T> {
        self.with_core(|core| Ok(read(core)))
    }

    /// Mutable access under the lock, for collaborator setup in tests and tools
    pub fn with_core_mut<T>(&self, f: impl FnOnce(&mut AuctionCore<C, A, F>) -> T) -> Result<T> {
        self.with_core(|core| Ok(f(core)))
    }

    pub fn snapshot(&self) -> Result<AuctionSnapshot> {
        self.inspect(|core| core.snapshot())
    }
}

impl<C, A, F> SharedAuction<C, A, F>
where
    C: Clock,
    A: AssetCustody,
    F: FundsSink,
{
    pub fn start(&self, caller: AccountId) -> Result<()> {
        self.with_core(|core| core.start(caller))
    }

    pub fn bid(&self, bidder: AccountId, amount: Amount) -> Result<()> {
        self.with_core(|core| core.bid(bidder, amount))
    }

    pub fn withdraw(&self, caller: AccountId) -> Result<Amount> {
        self.with_core(|core| core.withdraw(caller))
    }

    pub fn end(&self) -> Result<SettlementReceipt> {
        self.with_core(|core| core.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{mpsc, OnceLock};

    use crate::clock::ManualClock;
    use crate::config::AuctionConfig;
    use crate::custody::InMemoryCustody;
    use crate::error::TransferError;
    use crate::funds::InMemoryFunds;
    use crate::types::{AssetRef, Phase};

    const SELLER: AccountId = AccountId(1);
    const ASSET: AssetRef = AssetRef { collection: 1, item: 1 };

    fn custody() -> InMemoryCustody {
        let mut custody = InMemoryCustody::new();
        custody.mint(ASSET, SELLER);
        custody.approve(ASSET, SELLER);
        custody
    }

    /// Funds sink that tries to bid again from inside `collect`.
    struct ReenteringFunds {
        inner: InMemoryFunds,
        handle: Arc<OnceLock<SharedAuction<ManualClock, InMemoryCustody, ReenteringFunds>>>,
        observed: Arc<Mutex<Vec<AuctionError>>>,
    }

    impl FundsSink for ReenteringFunds {
        fn collect(
            &mut self,
            from: AccountId,
            amount: Amount,
        ) -> std::result::Result<(), TransferError> {
            if let Some(auction) = self.handle.get() {
                if let Err(err) = auction.bid(from, amount + 1) {
                    self.observed.lock().unwrap().push(err);
                }
            }
            self.inner.collect(from, amount)
        }

        fn send(
            &mut self,
            to: AccountId,
            amount: Amount,
        ) -> std::result::Result<(), TransferError> {
            self.inner.send(to, amount)
        }
    }

    #[test]
    fn test_shared_operations() {
        let clock = ManualClock::new(0);
        let mut funds = InMemoryFunds::new();
        funds.deposit(AccountId(2), 1_000);
        let config = AuctionConfig::new(SELLER, ASSET, 1, 60);
        let auction =
            SharedAuction::new(AuctionCore::new(config, clock.clone(), custody(), funds).unwrap());

        auction.start(SELLER).unwrap();
        auction.bid(AccountId(2), 200).unwrap();
        clock.advance(60);
        let receipt = auction.clone().end().unwrap();

        assert_eq!(receipt.winner(), Some(AccountId(2)));
        assert_eq!(auction.snapshot().unwrap().phase(), Phase::Ended);
        assert_eq!(
            auction.withdraw(AccountId(2)),
            Err(AuctionError::NoRefundAvailable { account: AccountId(2) })
        );
    }

    #[test]
    fn test_reentrant_bid_rejected() {
        let handle = Arc::new(OnceLock::new());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let mut inner = InMemoryFunds::new();
        inner.deposit(AccountId(2), 1_000);
        let funds = ReenteringFunds {
            inner,
            handle: Arc::clone(&handle),
            observed: Arc::clone(&observed),
        };

        let config = AuctionConfig::new(SELLER, ASSET, 1, 60);
        let core = AuctionCore::new(config, ManualClock::new(0), custody(), funds).unwrap();
        let auction = SharedAuction::new(core);
        assert!(handle.set(auction.clone()).is_ok());

        auction.start(SELLER).unwrap();
        auction.bid(AccountId(2), 200).unwrap();

        assert_eq!(*observed.lock().unwrap(), vec![AuctionError::Reentrant]);
        let (leader, highest) = auction
            .inspect(|core| (core.highest_bidder(), core.highest_bid()))
            .unwrap();
        assert_eq!(leader, Some(AccountId(2)));
        assert_eq!(highest, 200);

        // The handle is usable again once the outer call returned
        assert!(auction.inspect(|core| core.check_conservation().is_ok()).unwrap());
    }

    #[test]
    fn test_call_from_other_thread_waits_for_lock() {
        let mut funds = InMemoryFunds::new();
        funds.deposit(AccountId(2), 1_000);
        let config = AuctionConfig::new(SELLER, ASSET, 1, 60);
        let core = AuctionCore::new(config, ManualClock::new(0), custody(), funds).unwrap();
        let auction = SharedAuction::new(core);
        auction.start(SELLER).unwrap();

        let (ready_tx, ready_rx) = mpsc::channel();
        let bidder = auction
            .with_core_mut(|_| {
                let other = auction.clone();
                let bidder = thread::spawn(move || {
                    ready_tx.send(()).unwrap();
                    other.bid(AccountId(2), 200)
                });
                ready_rx.recv().unwrap();
                bidder
            })
            .unwrap();

        // Not detected as re-entrant: the bid runs once the lock is free
        assert_eq!(bidder.join().unwrap(), Ok(()));
        assert_eq!(auction.inspect(|core| core.highest_bid()).unwrap(), 200);
    }

    #[test]
    fn test_with_core_mut() {
        let config = AuctionConfig::new(SELLER, ASSET, 1, 60);
        let core =
            AuctionCore::new(config, ManualClock::new(0), custody(), InMemoryFunds::new()).unwrap();
        let auction = SharedAuction::new(core);

        auction.with_core_mut(|core| core.funds_mut().deposit(AccountId(5), 50)).unwrap();
        let balance = auction.inspect(|core| core.funds().balance_of(AccountId(5))).unwrap();
        assert_eq!(balance, 50);
    }
}
