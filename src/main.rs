//! Auction Kernel - Demo Entry Point
//!
//! Runs the canonical auction flows against in-memory collaborators and
//! prints the resulting events. Set `RUST_LOG=debug` for per-bid logs.

use auction_kernel::types::amount::{from_fixed_trimmed, to_fixed};
use auction_kernel::{
    AccountId, AssetRef, AuctionConfig, AuctionCore, InMemoryCustody, InMemoryFunds, ManualClock,
    MemoryLedger,
};
use tracing_subscriber::EnvFilter;

type DemoResult<T> = Result<T, Box<dyn std::error::Error>>;

const SELLER: AccountId = AccountId(1);
const ASSET: AssetRef = AssetRef { collection: 0xD1A, item: 1 };

type DemoAuction = AuctionCore<ManualClock, InMemoryCustody, InMemoryFunds>;

fn coins(s: &str) -> u64 {
    to_fixed(s).unwrap_or(0)
}

fn setup(
    starting_bid: &str,
    bidders: &[AccountId],
) -> DemoResult<(DemoAuction, ManualClock, MemoryLedger)> {
    let mut custody = InMemoryCustody::new();
    custody.mint(ASSET, SELLER);
    custody.approve(ASSET, SELLER);

    let mut funds = InMemoryFunds::new();
    for bidder in bidders {
        funds.deposit(*bidder, coins("10"));
    }

    let clock = ManualClock::new(1_703_577_600);
    let ledger = MemoryLedger::new();
    let config = AuctionConfig::new(SELLER, ASSET, 0, 60).with_starting_bid_str(starting_bid)?;
    let auction =
        AuctionCore::new(config, clock.clone(), custody, funds)?.with_ledger(ledger.clone());

    Ok((auction, clock, ledger))
}

fn report(title: &str, auction: &mut DemoAuction, ledger: &MemoryLedger) {
    println!("{title}");
    for event in auction.drain_events() {
        println!("  {event}");
    }
    println!("  Seller balance: {}", from_fixed_trimmed(auction.funds().balance_of(SELLER)));
    println!("  Escrow balance: {}", from_fixed_trimmed(auction.funds().escrow_balance()));
    println!("  Asset owner:    {:?}", auction.custody().owner_of(ASSET));
    println!("  Ledger head:    {} ({} entries)", ledger.head_hex(), ledger.len());
    println!();
}

fn outbid_and_withdraw() -> DemoResult<()> {
    let (u1, u2, u3) = (AccountId(11), AccountId(12), AccountId(13));
    let (mut auction, clock, ledger) = setup("0.001", &[u1, u2, u3])?;

    auction.start(SELLER)?;
    auction.bid(u1, coins("0.2"))?;
    auction.bid(u2, coins("0.8"))?;
    auction.bid(u3, coins("0.9"))?;

    if let Err(err) = auction.bid(u1, coins("0.9")) {
        println!("Rejected as expected: {err}");
    }

    clock.advance(60);
    auction.withdraw(u2)?;
    auction.withdraw(u1)?;
    let receipt = auction.end()?;
    println!("Settlement state root: {}", receipt.state_root_hex());

    report("Outbid + withdraw", &mut auction, &ledger);
    Ok(())
}

fn no_bids() -> DemoResult<()> {
    let (mut auction, clock, ledger) = setup("0.00000001", &[])?;

    auction.start(SELLER)?;
    clock.advance(60);
    auction.end()?;

    report("No bids", &mut auction, &ledger);
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("===========================================");
    println!("  Auction Kernel");
    println!("===========================================");
    println!();

    for (name, run) in [
        ("outbid_and_withdraw", outbid_and_withdraw as fn() -> DemoResult<()>),
        ("no_bids", no_bids),
    ] {
        if let Err(err) = run() {
            eprintln!("{name} failed: {err}");
            std::process::exit(1);
        }
    }
}
