//! End-to-end tests for the shielded sealed-bid auction.
//!
//! Each test drives the full in-process stack: the encryption client seals a
//! bid and registers it with the engine, the ledger admits it and folds it
//! through the opaque comparator, the seller ends the auction, the reveal
//! coordinator dispatches the single decryption request, and the engine's
//! attested callback finalizes the winner.

use reveal_coordinator::{CoordinatorError, RevealCoordinator};
use shielded_client::EncryptionClient;
use shielded_engine::ShieldEngine;
use shielded_ledger::handlers::{handle_bid, handle_end_auction, handle_open_auction};
use shielded_ledger::{AuctionConfig, AuctionError, AuctionLedger, CallContext};
use shielded_types::{sha256, Address, AuctionPhase, ItemMetadata, RevealResponse, Winner};

const OPENED_AT: u64 = 1_000;
const DURATION: u64 = 3_600;

fn address(label: &str) -> Address {
    let digest = sha256(label.as_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    Address::from_bytes(bytes)
}

/// A full in-process deployment: engine, ledger, coordinator, and a clock.
struct Auction {
    engine: ShieldEngine,
    ledger: AuctionLedger,
    coordinator: RevealCoordinator,
    auction_id: Address,
    seller: Address,
    now: u64,
}

impl Auction {
    fn open() -> Self {
        let mut engine = ShieldEngine::new();
        let coordinator = RevealCoordinator::new(engine.oracle_id(), engine.attestation_key());
        let seller = address("seller");
        let auction_id = address("auction");

        let config = AuctionConfig {
            auction_id,
            item: ItemMetadata {
                name: "Sealed lot".to_string(),
                description: "Single-item sealed-bid auction".to_string(),
                image_url: "ipfs://sealed-lot".to_string(),
            },
            bidding_duration: DURATION,
        };
        let ledger = handle_open_auction(
            config,
            &CallContext {
                sender: seller,
                timestamp: OPENED_AT,
            },
            &mut engine,
        )
        .expect("open failed");

        Self {
            engine,
            ledger,
            coordinator,
            auction_id,
            seller,
            now: OPENED_AT,
        }
    }

    /// Seal an amount through the client pipeline and submit it.
    fn bid(&mut self, bidder: Address, amount: u64) -> Result<(), AuctionError> {
        let client = EncryptionClient::new(bidder);
        let (handle, proof) = client
            .encrypt_bid(
                &mut self.engine,
                amount,
                &self.auction_id.to_checksum(),
                &bidder.to_checksum(),
            )
            .expect("sealing failed");

        self.now += 1;
        handle_bid(
            &mut self.ledger,
            &CallContext {
                sender: bidder,
                timestamp: self.now,
            },
            &mut self.engine,
            handle,
            proof,
        )
    }

    /// End the auction as the seller and dispatch the decryption request.
    fn end(&mut self) {
        self.now = self.ledger.bidding_end();
        let request = handle_end_auction(
            &mut self.ledger,
            &CallContext {
                sender: self.seller,
                timestamp: self.now,
            },
        )
        .expect("end failed");
        self.coordinator
            .dispatch(&mut self.engine, request)
            .expect("dispatch failed");
    }

    /// Pull the service's attested response without committing it.
    fn service_response(&mut self) -> RevealResponse {
        self.engine
            .fulfill_next()
            .expect("fulfilment failed")
            .expect("no queued request")
    }

    /// Let the decryption service respond and commit the winner.
    fn reveal(&mut self) -> Winner {
        let response = self.service_response();
        let oracle = self.engine.oracle_id();
        self.coordinator
            .finalize(&mut self.ledger, &oracle, response)
            .expect("finalize failed")
    }

    /// Run bids in order, end, and reveal.
    fn run(bids: &[(Address, u64)]) -> Winner {
        let mut auction = Auction::open();
        for (bidder, amount) in bids {
            auction.bid(*bidder, *amount).expect("bid rejected");
        }
        auction.end();
        auction.reveal()
    }
}

#[test]
fn test_sole_bid_round_trip() {
    let bidder = address("bidder-b");
    let mut auction = Auction::open();

    auction.bid(bidder, 777).unwrap();
    auction.end();
    let winner = auction.reveal();

    assert_eq!(winner.bidder, bidder);
    assert_eq!(winner.amount, 777);
    assert_eq!(auction.ledger.phase(), AuctionPhase::RevealFinalized);
    assert_eq!(auction.ledger.winner().unwrap(), &winner);
}

#[test]
fn test_highest_bid_wins_regardless_of_order() {
    let high = address("bidder-high");
    let low = address("bidder-low");

    let winner = Auction::run(&[(high, 900), (low, 400)]);
    assert_eq!((winner.bidder, winner.amount), (high, 900));

    let winner = Auction::run(&[(low, 400), (high, 900)]);
    assert_eq!((winner.bidder, winner.amount), (high, 900));
}

#[test]
fn test_equal_bids_keep_earliest_winner() {
    let first = address("bidder-first");
    let second = address("bidder-second");

    let winner = Auction::run(&[(first, 500), (second, 500)]);
    assert_eq!(winner.bidder, first);
    assert_eq!(winner.amount, 500);
}

#[test]
fn test_maximum_amount_survives_the_pipeline() {
    let greedy = address("bidder-max");
    let modest = address("bidder-m");

    let winner = Auction::run(&[(modest, 1), (greedy, u64::MAX)]);
    assert_eq!((winner.bidder, winner.amount), (greedy, u64::MAX));
}

#[test]
fn test_registry_queries_agree() {
    let mut auction = Auction::open();
    let bidders = [address("b0"), address("b1"), address("b2")];
    for (i, bidder) in bidders.iter().enumerate() {
        auction.bid(*bidder, 100 + i as u64).unwrap();
    }

    assert_eq!(auction.ledger.bidder_count(), auction.ledger.bidders().len());
    assert_eq!(auction.ledger.bidders(), &bidders);

    for bidder in &bidders {
        assert!(auction.ledger.has_bid(bidder));
        assert!(auction.ledger.encrypted_bid(bidder).is_some());
    }

    let stranger = address("stranger");
    assert!(!auction.ledger.has_bid(&stranger));
    assert!(auction.ledger.encrypted_bid(&stranger).is_none());
}

#[test]
fn test_duplicate_bid_rejected_without_state_change() {
    let bidder = address("bidder-b");
    let rival = address("bidder-r");
    let mut auction = Auction::open();

    auction.bid(bidder, 600).unwrap();
    auction.bid(rival, 300).unwrap();

    // Second submission, higher amount; rejected with nothing recorded.
    let result = auction.bid(bidder, 900);
    assert!(matches!(result, Err(AuctionError::AlreadyBid)));
    assert_eq!(auction.ledger.bidder_count(), 2);

    auction.end();
    let winner = auction.reveal();
    assert_eq!((winner.bidder, winner.amount), (bidder, 600));
}

#[test]
fn test_wrong_binding_proof_rejected() {
    let honest = address("bidder-h");
    let mallory = address("mallory");
    let mut auction = Auction::open();

    // A handle sealed for `honest`, submitted by `mallory`.
    let client = EncryptionClient::new(honest);
    let (handle, proof) = client
        .encrypt_bid(
            &mut auction.engine,
            800,
            &auction.auction_id.to_checksum(),
            &honest.to_checksum(),
        )
        .unwrap();

    let result = handle_bid(
        &mut auction.ledger,
        &CallContext {
            sender: mallory,
            timestamp: OPENED_AT + 1,
        },
        &mut auction.engine,
        handle,
        proof,
    );

    assert!(matches!(result, Err(AuctionError::InvalidProof)));
    assert_eq!(auction.ledger.bidder_count(), 0);
}

#[test]
fn test_end_auction_authorization() {
    let mut auction = Auction::open();
    auction.bid(address("bidder-b"), 300).unwrap();

    // Too early, even for the seller.
    let bidding_end = auction.ledger.bidding_end();
    let result = handle_end_auction(
        &mut auction.ledger,
        &CallContext {
            sender: auction.seller,
            timestamp: bidding_end - 1,
        },
    );
    assert!(matches!(result, Err(AuctionError::TooEarly)));

    // Past the deadline, but not the seller.
    let bidding_end = auction.ledger.bidding_end();
    let result = handle_end_auction(
        &mut auction.ledger,
        &CallContext {
            sender: address("stranger"),
            timestamp: bidding_end,
        },
    );
    assert!(matches!(result, Err(AuctionError::Unauthorized)));
    assert!(!auction.ledger.ended());

    // The seller succeeds exactly once.
    auction.end();
    let bidding_end = auction.ledger.bidding_end();
    let result = handle_end_auction(
        &mut auction.ledger,
        &CallContext {
            sender: auction.seller,
            timestamp: bidding_end + 100,
        },
    );
    assert!(matches!(result, Err(AuctionError::AlreadyEnded)));
}

#[test]
fn test_winner_gated_until_finalized() {
    let bidder = address("bidder-b");
    let mut auction = Auction::open();
    auction.bid(bidder, 300).unwrap();

    assert!(matches!(
        auction.ledger.winner(),
        Err(AuctionError::NotRevealed)
    ));

    auction.end();
    assert!(matches!(
        auction.ledger.winner(),
        Err(AuctionError::NotRevealed)
    ));

    let winner = auction.reveal();
    assert_eq!(auction.ledger.winner().unwrap(), &winner);
    assert_eq!((winner.bidder, winner.amount), (bidder, 300));
}

#[test]
fn test_stalled_service_leaves_auction_pending() {
    let mut auction = Auction::open();
    auction.bid(address("bidder-b"), 300).unwrap();
    auction.end();

    // The request is queued but never fulfilled. Nothing times out and
    // nothing retries; the auction just stays pending.
    assert_eq!(auction.engine.pending_reveals(), 1);
    assert_eq!(auction.ledger.phase(), AuctionPhase::RevealPending);
    assert!(auction.ledger.reveal_pending());
    assert!(!auction.ledger.reveal_finalized());
    assert!(matches!(
        auction.ledger.winner(),
        Err(AuctionError::NotRevealed)
    ));
}

#[test]
fn test_forged_callbacks_rejected() {
    let bidder = address("bidder-b");
    let mut auction = Auction::open();
    auction.bid(bidder, 300).unwrap();
    auction.end();

    let genuine = auction.service_response();
    let oracle = auction.engine.oracle_id();

    // Tampered amount breaks the attestation MAC.
    let mut forged = genuine.clone();
    forged.amount = 999;
    let result = auction
        .coordinator
        .finalize(&mut auction.ledger, &oracle, forged);
    assert_eq!(result, Err(CoordinatorError::UnauthorizedResponse));
    assert!(!auction.ledger.reveal_finalized());

    // A responder other than the provisioned oracle is refused outright.
    let result =
        auction
            .coordinator
            .finalize(&mut auction.ledger, &address("mallory"), genuine.clone());
    assert_eq!(result, Err(CoordinatorError::UnauthorizedResponse));
    assert!(!auction.ledger.reveal_finalized());

    // The untouched response still goes through afterwards.
    let winner = auction
        .coordinator
        .finalize(&mut auction.ledger, &oracle, genuine)
        .unwrap();
    assert_eq!((winner.bidder, winner.amount), (bidder, 300));
}

#[test]
fn test_second_callback_rejected_after_finalize() {
    let mut auction = Auction::open();
    auction.bid(address("bidder-b"), 300).unwrap();
    auction.end();

    let response = auction.service_response();
    let oracle = auction.engine.oracle_id();

    auction
        .coordinator
        .finalize(&mut auction.ledger, &oracle, response.clone())
        .unwrap();
    let winner = auction.ledger.winner().unwrap().clone();

    let replay = auction
        .coordinator
        .finalize(&mut auction.ledger, &oracle, response);
    assert_eq!(replay, Err(CoordinatorError::ReplayedResponse));
    assert_eq!(auction.ledger.winner().unwrap(), &winner);
}

#[test]
fn test_no_bidders_resolves_to_zero_sentinel() {
    let mut auction = Auction::open();
    auction.end();
    let winner = auction.reveal();

    // Both running values are still the opening sentinels: amount zero, and
    // an ordinal pointing at an empty registry.
    assert_eq!(winner.bidder, Address::ZERO);
    assert_eq!(winner.amount, 0);
    assert_eq!(auction.ledger.phase(), AuctionPhase::RevealFinalized);
}

#[test]
fn test_bids_after_deadline_rejected() {
    let late = address("bidder-late");
    let mut auction = Auction::open();
    auction.bid(address("bidder-b"), 300).unwrap();

    auction.now = auction.ledger.bidding_end();
    let result = auction.bid(late, 900);
    assert!(matches!(result, Err(AuctionError::AuctionClosed)));
    assert_eq!(auction.ledger.bidder_count(), 1);
}
