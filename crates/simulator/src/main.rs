//! Drives a complete shielded auction in process.
//!
//! One run walks the whole lifecycle: stand up the encryption service, open
//! the auction, seal and submit each requested bid through the client
//! pipeline, end the auction as the seller, dispatch the single decryption
//! request, and (unless stalled) accept the service's attested callback that
//! discloses the winner.

use anyhow::{anyhow, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use reveal_coordinator::RevealCoordinator;
use shielded_client::EncryptionClient;
use shielded_engine::ShieldEngine;
use shielded_ledger::handlers::{apply_call, handle_open_auction};
use shielded_ledger::queries::AuctionSummary;
use shielded_ledger::{AuctionCall, AuctionConfig, CallContext};
use shielded_types::{sha256, Address, ItemMetadata, Winner};

#[derive(Parser)]
#[command(name = "shielded-simulator")]
#[command(about = "Run a shielded sealed-bid auction end to end")]
struct Cli {
    /// Name of the item under auction
    #[arg(long, default_value = "Sealed lot")]
    item_name: String,

    /// Item description
    #[arg(long, default_value = "Single-item sealed-bid auction")]
    item_description: String,

    /// Item image reference
    #[arg(long, default_value = "ipfs://sealed-lot")]
    image_url: String,

    /// Bidding window length in seconds
    #[arg(long, default_value_t = 3600)]
    duration: u64,

    /// Sealed bid amount; repeat for multiple bidders
    #[arg(long = "bid", value_name = "AMOUNT")]
    bids: Vec<u64>,

    /// Leave the decryption request unfulfilled
    #[arg(long)]
    stall_reveal: bool,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunReport {
    auction: AuctionSummary,
    bidders: Vec<Address>,
    winner: Option<Winner>,
}

fn synthetic_address(label: &str) -> Address {
    let digest = sha256(label.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    Address::from_bytes(bytes)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shielded_simulator=info".parse()?)
                .add_directive("shielded_engine=info".parse()?)
                .add_directive("reveal_coordinator=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut engine = ShieldEngine::new();
    let mut coordinator = RevealCoordinator::new(engine.oracle_id(), engine.attestation_key());

    let seller = synthetic_address("simulator:seller");
    let auction_id = synthetic_address("simulator:auction");

    // Simulated clock; the ledger only sees the timestamps we hand it.
    let mut now = 1_700_000_000u64;

    let config = AuctionConfig {
        auction_id,
        item: ItemMetadata {
            name: cli.item_name,
            description: cli.item_description,
            image_url: cli.image_url,
        },
        bidding_duration: cli.duration,
    };
    let mut ledger = handle_open_auction(
        config,
        &CallContext {
            sender: seller,
            timestamp: now,
        },
        &mut engine,
    )?;

    info!(
        auction = %auction_id,
        bidding_end = ledger.bidding_end(),
        "Auction opened"
    );

    let mut bidders = Vec::new();
    for (ordinal, amount) in cli.bids.iter().enumerate() {
        let bidder = synthetic_address(&format!("simulator:bidder:{ordinal}"));
        let client = EncryptionClient::new(bidder);

        let (handle, proof) = client.encrypt_bid(
            &mut engine,
            *amount,
            &auction_id.to_checksum(),
            &bidder.to_checksum(),
        )?;

        now += 1;
        apply_call(
            &mut ledger,
            &CallContext {
                sender: bidder,
                timestamp: now,
            },
            &mut engine,
            AuctionCall::Bid { handle, proof },
        )?;

        info!(bidder = %bidder, "Sealed bid accepted");
        bidders.push(bidder);
    }

    now = ledger.bidding_end();
    let request = apply_call(
        &mut ledger,
        &CallContext {
            sender: seller,
            timestamp: now,
        },
        &mut engine,
        AuctionCall::EndAuction,
    )?
    .ok_or_else(|| anyhow!("ending the auction produced no reveal request"))?;
    coordinator.dispatch(&mut engine, request)?;

    if cli.stall_reveal {
        info!("Reveal left outstanding; the auction stays pending until the service responds");
    } else {
        let response = engine
            .fulfill_next()?
            .ok_or_else(|| anyhow!("decryption service had no queued request"))?;
        let oracle = engine.oracle_id();
        let winner = coordinator.finalize(&mut ledger, &oracle, response)?;
        info!(winner = %winner.bidder, amount = winner.amount, "Winner disclosed");
    }

    let report = RunReport {
        auction: AuctionSummary::from_ledger(&ledger),
        bidders,
        winner: ledger.winner().ok().cloned(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Auction {}", report.auction.auction_id);
        println!("  Item: {}", report.auction.item_name);
        println!("  Phase: {:?}", report.auction.phase);
        println!("  Bids accepted: {}", report.auction.num_bids);
        match &report.winner {
            Some(winner) => {
                println!("  Winner: {}", winner.bidder);
                println!("  Amount: {}", winner.amount);
            }
            None => println!("  Winner: not revealed"),
        }
    }

    Ok(())
}
