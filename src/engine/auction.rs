//! The auction state machine.
//!
//! ## Transitions
//!
//! ```text
//! Created --start()--> Started --end()--> Ended
//! Started --bid()-->      Started   (new leader, previous leader refundable)
//! *       --withdraw()--> *         (refund only, no phase change)
//! ```
//!
//! ## Escrow Accounting
//!
//! Every unit collected from a bidder is either the leading bid, a
//! refundable balance in the [`RefundBook`], or already released:
//!
//! `leading_escrow + refund_total == total_collected - total_released`
//!
//! ## External Calls
//!
//! Each operation validates, commits its own state, and only then calls the
//! custody or funds collaborator. If the collaborator fails, the committed
//! state is restored exactly and the error is returned, so a failed
//! operation is never observable.

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::AuctionConfig;
use crate::custody::AssetCustody;
use crate::error::{AuctionError, ConfigError, EscrowMismatch, Result};
use crate::escrow::RefundBook;
use crate::funds::FundsSink;
use crate::ledger::Ledger;
use crate::types::{
    AccountId, Amount, AssetRef, AuctionEvent, AuctionSnapshot, EventRecord, Phase,
    SettlementReceipt, Timestamp,
};

/// One auction over one asset.
///
/// Owns all mutable auction state and its collaborators. Operations take
/// `&mut self`, so a single instance is serial by construction; wrap it in
/// [`SharedAuction`](crate::engine::SharedAuction) to share it between threads.
///
/// ## Example
///
/// ```
/// use auction_kernel::clock::ManualClock;
/// use auction_kernel::config::AuctionConfig;
/// use auction_kernel::custody::InMemoryCustody;
/// use auction_kernel::engine::AuctionCore;
/// use auction_kernel::funds::InMemoryFunds;
/// use auction_kernel::types::{AccountId, AssetRef, Phase};
///
/// let (seller, bidder, asset) = (AccountId(1), AccountId(2), AssetRef::new(1, 1));
///
/// let mut custody = InMemoryCustody::new();
/// custody.mint(asset, seller);
/// custody.approve(asset, seller);
///
/// let mut funds = InMemoryFunds::new();
/// funds.deposit(bidder, 1_000);
///
/// let clock = ManualClock::new(0);
/// let config = AuctionConfig::new(seller, asset, 1, 60);
/// let mut auction = AuctionCore::new(config, clock.clone(), custody, funds).unwrap();
///
/// auction.start(seller).unwrap();
/// auction.bid(bidder, 200).unwrap();
///
/// clock.advance(60);
/// let receipt = auction.end().unwrap();
///
/// assert_eq!(auction.phase(), Phase::Ended);
/// assert_eq!(receipt.winner(), Some(bidder));
/// assert_eq!(auction.funds().balance_of(seller), 200);
/// assert_eq!(auction.custody().owner_of(asset), Some(bidder));
/// ```
pub struct AuctionCore<C, A, F> {
    config: AuctionConfig,

    clock: C,
    custody: A,
    funds: F,
    ledger: Option<Box<dyn Ledger + Send>>,

    phase: Phase,
    started_at: Option<Timestamp>,
    end_at: Option<Timestamp>,
    settled_at: Option<Timestamp>,

    /// Starts at the starting bid; raised by every accepted bid
    highest_bid: Amount,
    highest_bidder: Option<AccountId>,

    /// Refundable balances of outbid bidders
    refunds: RefundBook,

    total_collected: Amount,
    total_released: Amount,

    /// Outbox of emitted events, oldest first
    events: Vec<AuctionEvent>,
    event_count: u64,

    receipt: Option<SettlementReceipt>,
}

impl<C, A, F> AuctionCore<C, A, F>
where
    C: Clock,
    A: AssetCustody,
    F: FundsSink,
{
    /// Create an auction in phase `Created`
    pub fn new(
        config: AuctionConfig,
        clock: C,
        custody: A,
        funds: F,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            highest_bid: config.starting_bid,
            refunds: RefundBook::with_capacity(config.refund_capacity),
            config,
            clock,
            custody,
            funds,
            ledger: None,
            phase: Phase::Created,
            started_at: None,
            end_at: None,
            settled_at: None,
            highest_bidder: None,
            total_collected: 0,
            total_released: 0,
            events: Vec::new(),
            event_count: 0,
            receipt: None,
        })
    }

    /// Append every emitted event to `ledger`
    pub fn with_ledger(mut self, ledger: impl Ledger + Send + 'static) -> Self {
        self.ledger = Some(Box::new(ledger));
        self
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Move the asset into custody and open bidding until `now + duration`.
    pub fn start(&mut self, caller: AccountId) -> Result<()> {
        if caller != self.config.seller {
            debug!(%caller, "Start rejected: not the seller");
            return Err(AuctionError::Unauthorized { caller });
        }
        if self.phase != Phase::Created {
            return Err(AuctionError::InvalidPhase {
                operation: "start",
                phase: self.phase,
            });
        }

        let now = self.clock.now();
        let end_at = now
            .checked_add(self.config.duration)
            .ok_or(AuctionError::TimestampOverflow)?;

        self.phase = Phase::Started;
        self.started_at = Some(now);
        self.end_at = Some(end_at);

        if let Err(err) = self.custody.take_custody(self.config.asset, caller) {
            warn!(asset = %self.config.asset, error = %err, "Custody refused, start rolled back");
            self.phase = Phase::Created;
            self.started_at = None;
            self.end_at = None;
            return Err(err.into());
        }

        info!(
            seller = %caller,
            asset = %self.config.asset,
            started_at = now,
            end_at,
            "Auction started"
        );
        self.emit(AuctionEvent::Started { started_at: now, end_at }, now);
        Ok(())
    }

    /// Place a bid of `amount`, which must strictly exceed the highest bid.
    ///
    /// For a new leader, `amount` is collected in full and the previous
    /// leader's bid becomes refundable. If `bidder` already leads, `amount`
    /// is their new total and only `amount - highest_bid` is collected.
    pub fn bid(&mut self, bidder: AccountId, amount: Amount) -> Result<()> {
        if self.phase != Phase::Started {
            return Err(AuctionError::AuctionNotStarted);
        }
        let end_at = self.end_at.ok_or(AuctionError::AuctionNotStarted)?;

        let now = self.clock.now();
        if now >= end_at {
            debug!(%bidder, amount, end_at, "Bid rejected: auction expired");
            return Err(AuctionError::AuctionExpired { end_at });
        }
        if amount <= self.highest_bid {
            debug!(%bidder, amount, highest_bid = self.highest_bid, "Bid rejected: too low");
            return Err(AuctionError::BidTooLow {
                amount,
                highest_bid: self.highest_bid,
            });
        }

        let previous_bidder = self.highest_bidder;
        let previous_bid = self.highest_bid;
        let outbid = previous_bidder.filter(|leader| *leader != bidder);
        let prior_refund = outbid.and_then(|leader| self.refunds.get(leader).cloned());

        // A leader raising their own bid only adds the difference
        let attached = if previous_bidder == Some(bidder) {
            amount - previous_bid
        } else {
            amount
        };
        let collected = self
            .total_collected
            .checked_add(attached)
            .ok_or(AuctionError::AmountOverflow)?;

        if let Some(leader) = outbid {
            self.refunds.credit(leader, previous_bid, now)?;
        }
        self.highest_bidder = Some(bidder);
        self.highest_bid = amount;
        self.total_collected = collected;

        if let Err(err) = self.funds.collect(bidder, attached) {
            warn!(%bidder, amount, error = %err, "Funds not collected, bid rolled back");
            self.highest_bidder = previous_bidder;
            self.highest_bid = previous_bid;
            self.total_collected -= attached;
            if let Some(leader) = outbid {
                self.refunds.reset(leader, prior_refund)?;
            }
            return Err(err.into());
        }

        if let Some(leader) = outbid {
            debug!(%leader, refundable = previous_bid, "Leader outbid");
        }
        debug!(%bidder, amount, collected = attached, "Bid accepted");
        self.emit(AuctionEvent::BidPlaced { bidder, amount }, now);
        Ok(())
    }

    /// Pay out the whole refundable balance of `caller`.
    ///
    /// Allowed in any phase, so refunds stay claimable after settlement.
    pub fn withdraw(&mut self, caller: AccountId) -> Result<Amount> {
        let entry = match self.refunds.take_entry(caller) {
            Some(entry) if entry.balance > 0 => entry,
            Some(entry) => {
                self.refunds.restore(entry)?;
                return Err(AuctionError::NoRefundAvailable { account: caller });
            }
            None => return Err(AuctionError::NoRefundAvailable { account: caller }),
        };

        // Balance is zeroed above, before any funds move
        let amount = entry.balance;
        self.total_released = self
            .total_released
            .checked_add(amount)
            .ok_or(AuctionError::AmountOverflow)?;

        if let Err(err) = self.funds.send(caller, amount) {
            warn!(%caller, amount, error = %err, "Refund not sent, withdraw rolled back");
            self.total_released -= amount;
            self.refunds.restore(entry)?;
            return Err(err.into());
        }

        let now = self.clock.now();
        debug!(%caller, amount, "Refund withdrawn");
        self.emit(AuctionEvent::WithdrawMade { bidder: caller, amount }, now);
        Ok(amount)
    }

    /// Close bidding and settle, exactly once.
    ///
    /// The asset goes to the leader (or back to the seller if nobody bid),
    /// and the leading bid goes to the seller. If the payout to the seller
    /// fails after the asset has moved, the payout is credited to the
    /// seller's refundable balance instead, to be claimed with
    /// [`withdraw`](Self::withdraw), and the receipt is marked
    /// `payout_deferred`.
    pub fn end(&mut self) -> Result<SettlementReceipt> {
        match self.phase {
            Phase::Created => return Err(AuctionError::AuctionNotStarted),
            Phase::Ended => {
                return Err(AuctionError::InvalidPhase {
                    operation: "end",
                    phase: Phase::Ended,
                })
            }
            Phase::Started => {}
        }
        let end_at = self.end_at.ok_or(AuctionError::AuctionNotStarted)?;

        let now = self.clock.now();
        if now < end_at {
            debug!(now, end_at, "End rejected: auction still open");
            return Err(AuctionError::AuctionStillOpen { end_at });
        }

        let seller = self.config.seller;
        let asset = self.config.asset;
        let winner = self.highest_bidder;
        let amount = self.highest_bid;

        self.phase = Phase::Ended;
        self.settled_at = Some(now);

        let recipient = winner.unwrap_or(seller);
        if let Err(err) = self.custody.transfer_to(asset, recipient) {
            warn!(%asset, %recipient, error = %err, "Custody release failed, end rolled back");
            self.phase = Phase::Started;
            self.settled_at = None;
            return Err(err.into());
        }

        let mut payout_deferred = false;
        if winner.is_some() {
            self.total_released = self
                .total_released
                .checked_add(amount)
                .ok_or(AuctionError::AmountOverflow)?;

            if let Err(err) = self.funds.send(seller, amount) {
                warn!(
                    %seller,
                    amount,
                    error = %err,
                    "Seller payout failed, crediting refundable balance"
                );
                self.total_released -= amount;
                self.refunds.credit(seller, amount, now)?;
                payout_deferred = true;
            }
        }

        match winner {
            Some(winner) => info!(%winner, amount, %asset, "Auction settled"),
            None => info!(%asset, "Auction settled without bids, asset returned to seller"),
        }
        self.emit(AuctionEvent::Ended { winner, amount }, now);

        let root = self.state_root().unwrap_or_default();
        let mut receipt = SettlementReceipt::new(winner, amount, seller, now, root);
        if payout_deferred {
            receipt = receipt.with_deferred_payout();
        }
        self.receipt = Some(receipt.clone());
        Ok(receipt)
    }

    // ========================================================================
    // Time
    // ========================================================================

    /// Whether a bid placed now could be accepted on timing and phase alone
    pub fn is_open(&self) -> bool {
        match (self.phase, self.end_at) {
            (Phase::Started, Some(end_at)) => self.clock.now() < end_at,
            _ => false,
        }
    }

    /// Seconds until the deadline, `None` unless started and not ended
    pub fn time_remaining(&self) -> Option<u64> {
        if self.phase != Phase::Started {
            return None;
        }
        Some(self.end_at?.saturating_sub(self.clock.now()))
    }
}

impl<C, A, F> AuctionCore<C, A, F> {
    fn emit(&mut self, event: AuctionEvent, at: Timestamp) {
        self.event_count += 1;

        if let Some(ledger) = self.ledger.as_mut() {
            let record = EventRecord::from_event(self.event_count, &event, at);
            if let Err(err) = ledger.append(&record) {
                warn!(
                    sequence = self.event_count,
                    error = %err,
                    "Failed to append event to ledger"
                );
            }
        }

        self.events.push(event);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn seller(&self) -> AccountId {
        self.config.seller
    }

    #[inline]
    pub fn asset(&self) -> AssetRef {
        self.config.asset
    }

    #[inline]
    pub fn starting_bid(&self) -> Amount {
        self.config.starting_bid
    }

    #[inline]
    pub fn duration(&self) -> u64 {
        self.config.duration
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    #[inline]
    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    #[inline]
    pub fn end_at(&self) -> Option<Timestamp> {
        self.end_at
    }

    #[inline]
    pub fn settled_at(&self) -> Option<Timestamp> {
        self.settled_at
    }

    #[inline]
    pub fn highest_bid(&self) -> Amount {
        self.highest_bid
    }

    #[inline]
    pub fn highest_bidder(&self) -> Option<AccountId> {
        self.highest_bidder
    }

    /// Refundable balance of `account` (the `bids` mapping)
    pub fn refund_of(&self, account: AccountId) -> Amount {
        self.refunds.balance_of(account)
    }

    pub fn refund_total(&self) -> Amount {
        self.refunds.total()
    }

    pub fn refunds(&self) -> &RefundBook {
        &self.refunds
    }

    pub fn total_collected(&self) -> Amount {
        self.total_collected
    }

    pub fn total_released(&self) -> Amount {
        self.total_released
    }

    /// Funds currently held by the auction
    pub fn escrowed_funds(&self) -> Amount {
        self.total_collected.saturating_sub(self.total_released)
    }

    /// Escrowed amount backing the current leader (0 if none or settled)
    pub fn leading_escrow(&self) -> Amount {
        match (self.phase, self.highest_bidder) {
            (Phase::Started, Some(_)) => self.highest_bid,
            _ => 0,
        }
    }

    /// Check that held funds equal the leading bid plus all refunds
    pub fn check_conservation(&self) -> std::result::Result<(), EscrowMismatch> {
        let held = self.total_collected.checked_sub(self.total_released);
        let owed = self
            .refunds
            .recomputed_total()
            .filter(|total| *total == self.refunds.total())
            .and_then(|refunds| refunds.checked_add(self.leading_escrow()));

        match (held, owed) {
            (Some(held), Some(owed)) if held == owed => Ok(()),
            _ => Err(EscrowMismatch {
                held: self.escrowed_funds(),
                owed: self.refunds.total().saturating_add(self.leading_escrow()),
            }),
        }
    }

    /// Events emitted so far and not yet drained
    pub fn events(&self) -> &[AuctionEvent] {
        &self.events
    }

    /// Take all pending events out of the outbox
    pub fn drain_events(&mut self) -> Vec<AuctionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Total number of events emitted, drained or not
    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Receipt of the settlement, once ended
    pub fn settlement_receipt(&self) -> Option<&SettlementReceipt> {
        self.receipt.as_ref()
    }

    pub fn snapshot(&self) -> AuctionSnapshot {
        AuctionSnapshot {
            phase_raw: self.phase.to_u8(),
            seller: self.config.seller.raw(),
            asset_collection: self.config.asset.collection,
            asset_item: self.config.asset.item,
            starting_bid: self.config.starting_bid,
            duration: self.config.duration,
            started_at: self.started_at.unwrap_or(0),
            end_at: self.end_at.unwrap_or(0),
            highest_bid: self.highest_bid,
            highest_bidder: self.highest_bidder.map(AccountId::raw).unwrap_or(0),
            has_leader: self.highest_bidder.is_some(),
            refund_total: self.refunds.total(),
            refund_accounts: self.refunds.len() as u64,
            total_collected: self.total_collected,
            total_released: self.total_released,
            event_count: self.event_count,
        }
    }

    /// SHA-256 of the SSZ-encoded snapshot
    pub fn state_root(&self) -> Option<[u8; 32]> {
        self.snapshot().state_root()
    }

    pub fn state_root_hex(&self) -> Option<String> {
        self.state_root().map(hex::encode)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn custody(&self) -> &A {
        &self.custody
    }

    pub fn custody_mut(&mut self) -> &mut A {
        &mut self.custody
    }

    pub fn funds(&self) -> &F {
        &self.funds
    }

    pub fn funds_mut(&mut self) -> &mut F {
        &mut self.funds
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
