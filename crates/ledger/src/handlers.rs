//! Call handlers for the auction ledger.
//!
//! These functions implement the business logic for each state-changing
//! operation. Each handler performs every fallible check before touching
//! ledger state, so a failed call leaves no partial mutation behind.

use std::collections::HashMap;

use shielded_types::{
    reveal_request_id, Address, BidRecord, CiphertextHandle, InclusionProof, RevealRequest,
};

use crate::call::AuctionCall;
use crate::comparator::fold_highest;
use crate::config::AuctionConfig;
use crate::error::AuctionError;
use crate::ops::{OpaqueOps, OpsError};
use crate::state::AuctionLedger;

/// Context provided by the execution environment for each call.
///
/// The environment authenticates `sender` and applies calls atomically in
/// sequence; the ledger relies on both.
pub struct CallContext {
    /// Authenticated caller identity
    pub sender: Address,
    /// Current timestamp
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Open a new auction. The caller becomes the seller and the bidding
/// deadline is fixed, once and forever, at `timestamp + bidding_duration`.
pub fn handle_open_auction<O: OpaqueOps>(
    config: AuctionConfig,
    ctx: &CallContext,
    ops: &mut O,
) -> HandlerResult<AuctionLedger> {
    config.validate()?;

    let bidding_end = ctx.timestamp.saturating_add(config.bidding_duration);

    // Zero sentinels: the first accepted bid is adopted unconditionally.
    let highest_bid = ops.trivial_u64(0)?;
    let highest_bidder = ops.trivial_u64(0)?;

    Ok(AuctionLedger {
        config,
        seller: ctx.sender,
        bidding_end,
        ended: false,
        reveal_pending: false,
        reveal_finalized: false,
        highest_bid,
        highest_bidder,
        bidders: Vec::new(),
        bids: HashMap::new(),
        outstanding_request: None,
        winner: None,
    })
}

/// Admit a sealed bid.
///
/// Rejects when the auction is no longer active, when the caller already has
/// a bid record, or when the proof does not bind the handle to
/// `(this auction, caller)`. On acceptance the bid is recorded and folded
/// into the running highest through the opaque comparator.
pub fn handle_bid<O: OpaqueOps>(
    ledger: &mut AuctionLedger,
    ctx: &CallContext,
    ops: &mut O,
    handle: CiphertextHandle,
    proof: InclusionProof,
) -> HandlerResult<()> {
    if ledger.ended || ctx.timestamp >= ledger.bidding_end {
        return Err(AuctionError::AuctionClosed);
    }
    if ledger.bids.contains_key(&ctx.sender) {
        return Err(AuctionError::AlreadyBid);
    }

    ops.verify_input(&handle, &proof, &ledger.config.auction_id, &ctx.sender)
        .map_err(|err| match err {
            OpsError::UnknownHandle
            | OpsError::BindingMismatch
            | OpsError::CommitmentMismatch => AuctionError::InvalidProof,
            other => AuctionError::Ops(other),
        })?;

    let ordinal = ledger.bidders.len() as u64;
    let (highest_bid, highest_bidder) = fold_highest(
        ops,
        &ledger.highest_bid,
        &ledger.highest_bidder,
        &handle,
        ordinal,
    )?;

    ledger.highest_bid = highest_bid;
    ledger.highest_bidder = highest_bidder;
    ledger.bidders.push(ctx.sender);
    ledger.bids.insert(
        ctx.sender,
        BidRecord {
            bidder: ctx.sender,
            handle,
            ordinal,
        },
    );

    Ok(())
}

/// End the auction.
///
/// Seller-only, after the bidding deadline, exactly once. Ending flips
/// `ended` and `reveal_pending` together and produces the single decryption
/// request covering the running highest bid and bidder.
pub fn handle_end_auction(
    ledger: &mut AuctionLedger,
    ctx: &CallContext,
) -> HandlerResult<RevealRequest> {
    if ctx.sender != ledger.seller {
        return Err(AuctionError::Unauthorized);
    }
    if ctx.timestamp < ledger.bidding_end {
        return Err(AuctionError::TooEarly);
    }
    if ledger.ended {
        return Err(AuctionError::AlreadyEnded);
    }

    let request_id = reveal_request_id(
        &ledger.config.auction_id,
        &ledger.highest_bid,
        &ledger.highest_bidder,
    );

    ledger.ended = true;
    ledger.reveal_pending = true;
    ledger.outstanding_request = Some(request_id);

    Ok(RevealRequest {
        request_id,
        amount: ledger.highest_bid,
        bidder_index: ledger.highest_bidder,
    })
}

/// Apply a call message to the ledger.
///
/// Ending the auction yields the decryption request the caller must hand to
/// the reveal coordinator.
pub fn apply_call<O: OpaqueOps>(
    ledger: &mut AuctionLedger,
    ctx: &CallContext,
    ops: &mut O,
    call: AuctionCall,
) -> HandlerResult<Option<RevealRequest>> {
    match call {
        AuctionCall::Bid { handle, proof } => {
            handle_bid(ledger, ctx, ops, handle, proof)?;
            Ok(None)
        }
        AuctionCall::EndAuction => handle_end_auction(ledger, ctx).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PlainOps;
    use shielded_types::{AuctionPhase, ItemMetadata, Winner};

    const AUCTION: Address = Address([9u8; 20]);
    const SELLER: Address = Address([1u8; 20]);

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    fn ctx(sender: Address, timestamp: u64) -> CallContext {
        CallContext { sender, timestamp }
    }

    fn config() -> AuctionConfig {
        AuctionConfig {
            auction_id: AUCTION,
            item: ItemMetadata {
                name: "Painting".to_string(),
                description: "Oil on canvas".to_string(),
                image_url: "ipfs://painting".to_string(),
            },
            bidding_duration: 1000,
        }
    }

    fn open(ops: &mut PlainOps) -> AuctionLedger {
        handle_open_auction(config(), &ctx(SELLER, 100), ops).unwrap()
    }

    fn bid(
        ledger: &mut AuctionLedger,
        ops: &mut PlainOps,
        bidder: Address,
        value: u64,
        timestamp: u64,
    ) -> HandlerResult<()> {
        let (handle, proof) = ops.register(AUCTION, bidder, value);
        handle_bid(ledger, &ctx(bidder, timestamp), ops, handle, proof)
    }

    #[test]
    fn test_open_fixes_deadline() {
        let mut ops = PlainOps::new();
        let ledger = open(&mut ops);

        assert_eq!(ledger.bidding_end(), 1100);
        assert_eq!(*ledger.seller(), SELLER);
        assert_eq!(ledger.phase(), AuctionPhase::Active);
        assert_eq!(ledger.bidder_count(), 0);
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let mut ops = PlainOps::new();
        let mut bad = config();
        bad.item.name.clear();

        let result = handle_open_auction(bad, &ctx(SELLER, 100), &mut ops);
        assert!(matches!(result, Err(AuctionError::Config(_))));
    }

    #[test]
    fn test_bid_accepted() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        bid(&mut ledger, &mut ops, addr(2), 300, 500).unwrap();

        assert_eq!(ledger.bidder_count(), 1);
        assert!(ledger.has_bid(&addr(2)));
        assert!(ledger.encrypted_bid(&addr(2)).is_some());
        assert_eq!(ledger.bid_record(&addr(2)).unwrap().ordinal, 0);
        assert_eq!(ops.reveal_num(&ledger.highest_bid), 300);
    }

    #[test]
    fn test_bid_after_deadline_rejected() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        let result = bid(&mut ledger, &mut ops, addr(2), 300, 1100);
        assert_eq!(result, Err(AuctionError::AuctionClosed));
        assert_eq!(ledger.bidder_count(), 0);
    }

    #[test]
    fn test_duplicate_bid_rejected() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        bid(&mut ledger, &mut ops, addr(2), 300, 500).unwrap();
        let before = ledger.highest_bid;

        let result = bid(&mut ledger, &mut ops, addr(2), 900, 600);
        assert_eq!(result, Err(AuctionError::AlreadyBid));

        // Count and running highest untouched.
        assert_eq!(ledger.bidder_count(), 1);
        assert_eq!(ledger.highest_bid, before);
    }

    #[test]
    fn test_wrong_binding_rejected() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        // Handle bound to a different bidder, submitted by addr(2).
        let (handle, proof) = ops.register(AUCTION, addr(3), 300);
        let result = handle_bid(&mut ledger, &ctx(addr(2), 500), &mut ops, handle, proof);

        assert_eq!(result, Err(AuctionError::InvalidProof));
        assert_eq!(ledger.bidder_count(), 0);
    }

    #[test]
    fn test_end_too_early() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        let result = handle_end_auction(&mut ledger, &ctx(SELLER, 1099));
        assert!(matches!(result, Err(AuctionError::TooEarly)));
        assert!(!ledger.ended());
    }

    #[test]
    fn test_end_unauthorized() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        let result = handle_end_auction(&mut ledger, &ctx(addr(2), 2000));
        assert!(matches!(result, Err(AuctionError::Unauthorized)));
    }

    #[test]
    fn test_end_exactly_once() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);
        bid(&mut ledger, &mut ops, addr(2), 300, 500).unwrap();

        let request = handle_end_auction(&mut ledger, &ctx(SELLER, 1100)).unwrap();
        assert_eq!(ledger.phase(), AuctionPhase::RevealPending);
        assert_eq!(ledger.outstanding_request(), Some(&request.request_id));

        let result = handle_end_auction(&mut ledger, &ctx(SELLER, 1200));
        assert!(matches!(result, Err(AuctionError::AlreadyEnded)));
    }

    #[test]
    fn test_bid_after_end_rejected() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);
        handle_end_auction(&mut ledger, &ctx(SELLER, 1100)).unwrap();

        let result = bid(&mut ledger, &mut ops, addr(2), 300, 1200);
        assert_eq!(result, Err(AuctionError::AuctionClosed));
    }

    #[test]
    fn test_apply_call_round_trips_messages() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        let (handle, proof) = ops.register(AUCTION, addr(2), 300);
        let encoded = borsh::to_vec(&AuctionCall::Bid { handle, proof }).unwrap();
        let call: AuctionCall = borsh::from_slice(&encoded).unwrap();

        let produced = apply_call(&mut ledger, &ctx(addr(2), 500), &mut ops, call).unwrap();
        assert!(produced.is_none());
        assert_eq!(ledger.bidder_count(), 1);

        let request = apply_call(
            &mut ledger,
            &ctx(SELLER, 1100),
            &mut ops,
            AuctionCall::EndAuction,
        )
        .unwrap()
        .expect("ending must produce a reveal request");
        assert_eq!(ledger.outstanding_request(), Some(&request.request_id));
    }

    #[test]
    fn test_winner_gated_on_finalize() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);
        bid(&mut ledger, &mut ops, addr(2), 300, 500).unwrap();

        assert!(matches!(ledger.winner(), Err(AuctionError::NotRevealed)));

        let request = handle_end_auction(&mut ledger, &ctx(SELLER, 1100)).unwrap();
        assert!(matches!(ledger.winner(), Err(AuctionError::NotRevealed)));

        let winner = Winner {
            bidder: addr(2),
            amount: 300,
        };
        ledger
            .commit_winner(&request.request_id, winner.clone())
            .unwrap();

        assert_eq!(ledger.phase(), AuctionPhase::RevealFinalized);
        assert_eq!(ledger.winner().unwrap(), &winner);
    }

    #[test]
    fn test_commit_winner_replay_rejected() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);
        bid(&mut ledger, &mut ops, addr(2), 300, 500).unwrap();
        let request = handle_end_auction(&mut ledger, &ctx(SELLER, 1100)).unwrap();

        let winner = Winner {
            bidder: addr(2),
            amount: 300,
        };
        ledger
            .commit_winner(&request.request_id, winner.clone())
            .unwrap();

        let replay = ledger.commit_winner(
            &request.request_id,
            Winner {
                bidder: addr(3),
                amount: 999,
            },
        );
        assert!(matches!(replay, Err(AuctionError::RevealReplayed)));
        assert_eq!(ledger.winner().unwrap(), &winner);
    }

    #[test]
    fn test_commit_winner_requires_pending() {
        let mut ops = PlainOps::new();
        let mut ledger = open(&mut ops);

        let result = ledger.commit_winner(
            &shielded_types::RequestId([0u8; 32]),
            Winner {
                bidder: addr(2),
                amount: 300,
            },
        );
        assert!(matches!(result, Err(AuctionError::RevealNotPending)));
    }
}
