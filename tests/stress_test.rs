//! Stress tests for the auction kernel.
//!
//! These tests verify:
//! 1. Escrow conservation holds after every operation of long random runs
//! 2. Phases only move forward and settlement happens exactly once
//! 3. Determinism is preserved across runs
//! 4. Concurrent bidders through `SharedAuction` never break the books
//!
//! ## Running Stress Tests
//!
//! ```bash
//! # Run all stress tests (release mode recommended)
//! cargo test --release --test stress_test -- --nocapture
//!
//! # Run specific test
//! cargo test --release --test stress_test stress_random_operations -- --nocapture
//! ```

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use auction_kernel::{
    AccountId, Amount, AssetRef, AuctionConfig, AuctionCore, AuctionError, InMemoryCustody,
    InMemoryFunds, ManualClock, MemoryLedger, Phase, SharedAuction,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

/// Operations per random run
const STRESS_OP_COUNT: usize = 20_000;

/// Distinct bidders drawing from the RNG
const BIDDER_COUNT: u64 = 32;

/// Spendable funds per bidder
const DEPOSIT: Amount = 1_000_000_000_000_000;

/// Auction duration in seconds
const DURATION: u64 = 5_000;

const SELLER: AccountId = AccountId(1);
const ASSET: AssetRef = AssetRef { collection: 9, item: 9 };

type TestAuction = AuctionCore<ManualClock, InMemoryCustody, InMemoryFunds>;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn bidder(n: u64) -> AccountId {
    AccountId(100 + n)
}

fn all_bidders() -> impl Iterator<Item = AccountId> {
    (0..BIDDER_COUNT).map(bidder)
}

fn new_auction(clock: &ManualClock) -> TestAuction {
    let mut custody = InMemoryCustody::new();
    custody.mint(ASSET, SELLER);
    custody.approve(ASSET, SELLER);

    let mut funds = InMemoryFunds::new();
    for account in all_bidders() {
        funds.deposit(account, DEPOSIT);
    }

    let config = AuctionConfig::new(SELLER, ASSET, 1_000, DURATION);
    AuctionCore::new(config, clock.clone(), custody, funds).unwrap()
}

/// Every unit ever deposited is still somewhere: an account or escrow.
fn funds_in_system(auction: &TestAuction) -> u128 {
    let accounts: u128 = all_bidders()
        .chain(std::iter::once(SELLER))
        .map(|account| auction.funds().balance_of(account) as u128)
        .sum();
    accounts + auction.funds().escrow_balance() as u128
}

fn assert_books(auction: &TestAuction, step: usize) {
    assert!(
        auction.check_conservation().is_ok(),
        "conservation broken at step {step}: {:?}",
        auction.check_conservation()
    );
    assert_eq!(
        auction.escrowed_funds(),
        auction.funds().escrow_balance(),
        "auction books disagree with escrow at step {step}"
    );
    assert_eq!(
        funds_in_system(auction),
        DEPOSIT as u128 * BIDDER_COUNT as u128,
        "funds created or destroyed at step {step}"
    );
}

/// Drive one auction with a seeded random operation sequence, settle it,
/// drain every refund and return the final state root.
fn run_random_auction(seed: u64, ops: usize) -> [u8; 32] {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let clock = ManualClock::new(1_703_577_600);
    let ledger = MemoryLedger::new();
    let mut auction = new_auction(&clock).with_ledger(ledger.clone());

    auction.start(SELLER).unwrap();
    let mut last_phase = auction.phase().to_u8();
    let mut accepted = 0usize;

    for step in 0..ops {
        let who = bidder(rng.gen_range(0..BIDDER_COUNT));
        let roll: u32 = rng.gen_range(0..100);

        match roll {
            0..=64 => {
                // Mostly valid raises, some deliberately too low
                let highest = auction.highest_bid();
                let amount = if rng.gen_bool(0.9) {
                    highest + rng.gen_range(1..=10_000)
                } else {
                    highest.saturating_sub(rng.gen_range(0..=500))
                };
                let before = (auction.highest_bid(), auction.highest_bidder());
                match auction.bid(who, amount) {
                    Ok(()) => {
                        accepted += 1;
                        assert_eq!(auction.highest_bid(), amount);
                        assert_eq!(auction.highest_bidder(), Some(who));
                    }
                    Err(AuctionError::BidTooLow { .. })
                    | Err(AuctionError::AuctionExpired { .. }) => {
                        assert_eq!((auction.highest_bid(), auction.highest_bidder()), before);
                    }
                    Err(err) => panic!("unexpected bid error at step {step}: {err}"),
                }
            }
            65..=84 => {
                let owed = auction.refund_of(who);
                match auction.withdraw(who) {
                    Ok(paid) => {
                        assert_eq!(paid, owed);
                        assert_eq!(auction.refund_of(who), 0);
                    }
                    Err(AuctionError::NoRefundAvailable { .. }) => assert_eq!(owed, 0),
                    Err(AuctionError::Transfer(_)) => assert_eq!(auction.refund_of(who), owed),
                    Err(err) => panic!("unexpected withdraw error at step {step}: {err}"),
                }
            }
            85..=89 => auction.funds_mut().reject_sends_to(who),
            90..=94 => auction.funds_mut().accept_sends_to(who),
            _ => {
                clock.advance(rng.gen_range(0..=2));
            }
        }

        assert_books(&auction, step);
        let phase = auction.phase().to_u8();
        assert!(phase >= last_phase, "phase moved backwards at step {step}");
        last_phase = phase;
    }

    assert!(accepted > 0, "expected some bids to be accepted");

    // Settle and drain every refund
    clock.advance(DURATION);
    for account in all_bidders() {
        auction.funds_mut().accept_sends_to(account);
    }
    let receipt = auction.end().unwrap();
    assert_eq!(auction.phase(), Phase::Ended);
    assert!(auction.end().is_err(), "settlement must happen once");
    assert_books(&auction, ops);

    for account in all_bidders() {
        let _ = auction.withdraw(account);
    }
    assert_eq!(auction.refund_total(), 0);
    assert_eq!(auction.funds().escrow_balance(), 0);
    assert_eq!(auction.funds().balance_of(SELLER), receipt.amount);
    assert!(ledger.verify());
    assert_eq!(ledger.len() as u64, auction.event_count());

    auction.state_root().unwrap()
}

// ============================================================================
// STRESS TESTS
// ============================================================================

/// Long random run: books balance after every single operation.
#[test]
fn stress_random_operations() {
    println!("\n=== STRESS TEST: {} Random Operations ===\n", STRESS_OP_COUNT);

    let start = Instant::now();
    let root = run_random_auction(42, STRESS_OP_COUNT);
    let elapsed = start.elapsed();
    let throughput = STRESS_OP_COUNT as f64 / elapsed.as_secs_f64();

    println!("  Operations:        {:>12}", STRESS_OP_COUNT);
    println!("  Elapsed time:      {:>12.2?}", elapsed);
    println!("  Throughput:        {:>12.0} ops/sec", throughput);
    println!("  State root:        {}", hex::encode(root));

    println!("\n=== STRESS TEST PASSED ===\n");
}

/// Several seeds, shorter runs.
#[test]
fn stress_many_seeds() {
    for seed in 0..16 {
        run_random_auction(seed, 2_000);
    }
}

/// Same operation sequence produces the same final state root.
#[test]
fn verify_determinism() {
    println!("\n=== DETERMINISM TEST ===\n");

    const TEST_COUNT: usize = 5_000;
    const SEED: u64 = 12345;

    let root1 = run_random_auction(SEED, TEST_COUNT);
    let root2 = run_random_auction(SEED, TEST_COUNT);

    println!("  Run 1 state root: {}", hex::encode(root1));
    println!("  Run 2 state root: {}", hex::encode(root2));
    assert_eq!(root1, root2, "State roots must match for determinism");

    let root3 = run_random_auction(SEED + 1, TEST_COUNT);
    println!("  Different seed:   {}", hex::encode(root3));
    assert_ne!(root1, root3, "Different seeds should produce different roots");

    println!("\n=== DETERMINISM VERIFIED ===\n");
}

/// Refund accounts are reused, not duplicated, no matter how often a
/// bidder is outbid.
#[test]
fn stress_refund_book_bounded() {
    let clock = ManualClock::new(0);
    let mut auction = new_auction(&clock);
    auction.start(SELLER).unwrap();

    let mut amount = 1_000;
    for round in 0..10_000u64 {
        amount += 1;
        auction.bid(bidder(round % 4), amount).unwrap();
    }

    assert_eq!(auction.refunds().len(), 4);
    assert!(auction.check_conservation().is_ok());
}

/// Concurrent bidders: bids are serialized and the books still balance.
#[test]
fn stress_concurrent_bidders() {
    println!("\n=== CONCURRENT BIDDING TEST ===\n");

    const THREADS: u64 = 8;
    const BIDS_PER_THREAD: usize = 2_000;

    let clock = ManualClock::new(0);
    let auction = SharedAuction::new(new_auction(&clock));
    auction.start(SELLER).unwrap();

    let accepted: Arc<Mutex<Vec<Amount>>> = Arc::new(Mutex::new(Vec::new()));
    let start = Instant::now();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let auction = auction.clone();
            let accepted = Arc::clone(&accepted);
            thread::spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(t);
                let me = bidder(t);
                let mut rejected = 0usize;

                for _ in 0..BIDS_PER_THREAD {
                    let highest = auction.inspect(|core| core.highest_bid()).unwrap();
                    let amount = highest + rng.gen_range(1..=100);
                    match auction.bid(me, amount) {
                        Ok(()) => accepted.lock().unwrap().push(amount),
                        Err(AuctionError::BidTooLow { .. }) => rejected += 1,
                        Err(err) => panic!("unexpected bid error: {err}"),
                    }
                    if rng.gen_bool(0.1) {
                        let _ = auction.withdraw(me);
                    }
                }
                rejected
            })
        })
        .collect();

    let rejected: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let elapsed = start.elapsed();

    let accepted = accepted.lock().unwrap().clone();
    let max_accepted = accepted.iter().copied().max().unwrap();

    auction
        .inspect(|core| {
            assert_eq!(core.highest_bid(), max_accepted);
            assert!(core.check_conservation().is_ok());
            assert_eq!(core.escrowed_funds(), core.funds().escrow_balance());
        })
        .unwrap();

    println!("  Bids accepted:     {:>12}", accepted.len());
    println!("  Bids rejected:     {:>12}", rejected);
    println!("  Elapsed time:      {:>12.2?}", elapsed);

    clock.advance(DURATION);
    let receipt = auction.end().unwrap();
    assert_eq!(receipt.amount, max_accepted);

    for account in all_bidders() {
        let _ = auction.withdraw(account);
    }
    auction
        .inspect(|core| {
            assert_eq!(core.refund_total(), 0);
            assert_eq!(core.funds().escrow_balance(), 0);
            assert_eq!(core.funds().balance_of(SELLER), max_accepted);
        })
        .unwrap();

    println!("\n=== CONCURRENT BIDDING PASSED ===\n");
}
