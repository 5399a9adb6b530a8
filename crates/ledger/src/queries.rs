//! Query handlers for the auction ledger.
//!
//! These provide read-only access to ledger state and never mutate it. The
//! winner query returns `None` as the defined empty sentinel until the reveal
//! is finalized; the `AuctionLedger::winner` accessor fails explicitly
//! instead.

use serde::{Deserialize, Serialize};
use shielded_types::{Address, AuctionPhase, CiphertextHandle, Winner};

use crate::state::AuctionLedger;

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get the seller identity.
    GetSeller,

    /// Get the immutable item metadata.
    GetItem,

    /// Get the bidding deadline.
    GetBiddingEnd,

    /// Get the lifecycle flags and derived phase.
    GetStatus,

    /// Get the number of accepted bids.
    GetBidderCount,

    /// Get the acceptance-ordered bidder list.
    GetBidders,

    /// Check whether an identity has a bid record.
    HasBid { identity: Address },

    /// Get an identity's own sealed bid handle.
    GetEncryptedBid { identity: Address },

    /// Get the disclosed winner, if finalized.
    GetWinner,
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    Seller(Address),

    Item {
        name: String,
        description: String,
        image_url: String,
    },

    BiddingEnd(u64),

    Status {
        phase: AuctionPhase,
        ended: bool,
        reveal_pending: bool,
        reveal_finalized: bool,
    },

    BidderCount(usize),

    Bidders(Vec<Address>),

    HasBid(bool),

    EncryptedBid(Option<CiphertextHandle>),

    /// `None` until the reveal is finalized.
    Winner(Option<Winner>),
}

/// Handle a query.
pub fn handle_query(ledger: &AuctionLedger, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetSeller => AuctionQueryResponse::Seller(*ledger.seller()),

        AuctionQuery::GetItem => AuctionQueryResponse::Item {
            name: ledger.item_name().to_string(),
            description: ledger.item_description().to_string(),
            image_url: ledger.item_image_url().to_string(),
        },

        AuctionQuery::GetBiddingEnd => AuctionQueryResponse::BiddingEnd(ledger.bidding_end()),

        AuctionQuery::GetStatus => AuctionQueryResponse::Status {
            phase: ledger.phase(),
            ended: ledger.ended(),
            reveal_pending: ledger.reveal_pending(),
            reveal_finalized: ledger.reveal_finalized(),
        },

        AuctionQuery::GetBidderCount => AuctionQueryResponse::BidderCount(ledger.bidder_count()),

        AuctionQuery::GetBidders => AuctionQueryResponse::Bidders(ledger.bidders().to_vec()),

        AuctionQuery::HasBid { identity } => {
            AuctionQueryResponse::HasBid(ledger.has_bid(&identity))
        }

        AuctionQuery::GetEncryptedBid { identity } => {
            AuctionQueryResponse::EncryptedBid(ledger.encrypted_bid(&identity))
        }

        AuctionQuery::GetWinner => AuctionQueryResponse::Winner(ledger.winner().ok().cloned()),
    }
}

/// Summary of the auction for listing surfaces.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: Address,
    pub seller: Address,
    pub item_name: String,
    pub phase: AuctionPhase,
    pub bidding_end: u64,
    pub num_bids: usize,
}

impl AuctionSummary {
    /// Create a summary from the ledger.
    pub fn from_ledger(ledger: &AuctionLedger) -> Self {
        Self {
            auction_id: *ledger.auction_id(),
            seller: *ledger.seller(),
            item_name: ledger.item_name().to_string(),
            phase: ledger.phase(),
            bidding_end: ledger.bidding_end(),
            num_bids: ledger.bidder_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuctionConfig;
    use crate::handlers::{handle_bid, handle_open_auction, CallContext};
    use crate::testing::PlainOps;
    use shielded_types::ItemMetadata;

    const AUCTION: Address = Address([9u8; 20]);
    const SELLER: Address = Address([1u8; 20]);

    fn ledger(ops: &mut PlainOps) -> AuctionLedger {
        let config = AuctionConfig {
            auction_id: AUCTION,
            item: ItemMetadata {
                name: "Painting".to_string(),
                description: "Oil on canvas".to_string(),
                image_url: "ipfs://painting".to_string(),
            },
            bidding_duration: 1000,
        };
        handle_open_auction(
            config,
            &CallContext {
                sender: SELLER,
                timestamp: 100,
            },
            ops,
        )
        .unwrap()
    }

    #[test]
    fn test_status_query() {
        let mut ops = PlainOps::new();
        let ledger = ledger(&mut ops);

        let response = handle_query(&ledger, AuctionQuery::GetStatus);
        assert!(matches!(
            response,
            AuctionQueryResponse::Status {
                phase: AuctionPhase::Active,
                ended: false,
                reveal_pending: false,
                reveal_finalized: false,
            }
        ));
    }

    #[test]
    fn test_winner_sentinel_before_finalize() {
        let mut ops = PlainOps::new();
        let ledger = ledger(&mut ops);

        let response = handle_query(&ledger, AuctionQuery::GetWinner);
        assert!(matches!(response, AuctionQueryResponse::Winner(None)));
    }

    #[test]
    fn test_bidder_queries_agree() {
        let mut ops = PlainOps::new();
        let mut ledger = ledger(&mut ops);

        let bidder = Address::from_bytes([2u8; 20]);
        let (handle, proof) = ops.register(AUCTION, bidder, 300);
        handle_bid(
            &mut ledger,
            &CallContext {
                sender: bidder,
                timestamp: 500,
            },
            &mut ops,
            handle,
            proof,
        )
        .unwrap();

        let count = match handle_query(&ledger, AuctionQuery::GetBidderCount) {
            AuctionQueryResponse::BidderCount(n) => n,
            other => panic!("unexpected response: {:?}", other),
        };
        let bidders = match handle_query(&ledger, AuctionQuery::GetBidders) {
            AuctionQueryResponse::Bidders(b) => b,
            other => panic!("unexpected response: {:?}", other),
        };
        assert_eq!(count, bidders.len());
        assert_eq!(bidders, vec![bidder]);

        assert!(matches!(
            handle_query(&ledger, AuctionQuery::HasBid { identity: bidder }),
            AuctionQueryResponse::HasBid(true)
        ));
        assert!(matches!(
            handle_query(&ledger, AuctionQuery::GetEncryptedBid { identity: bidder }),
            AuctionQueryResponse::EncryptedBid(Some(_))
        ));
    }

    #[test]
    fn test_summary_projection() {
        let mut ops = PlainOps::new();
        let ledger = ledger(&mut ops);

        let summary = AuctionSummary::from_ledger(&ledger);
        assert_eq!(summary.item_name, "Painting");
        assert_eq!(summary.num_bids, 0);
        assert_eq!(summary.phase, AuctionPhase::Active);
    }
}
