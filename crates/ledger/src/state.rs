//! Ledger state for the shielded auction.

use std::collections::HashMap;

use shielded_types::{
    Address, AuctionPhase, BidRecord, CiphertextHandle, ItemMetadata, RequestId, Winner,
};

use crate::config::AuctionConfig;
use crate::error::AuctionError;

/// The authoritative auction record.
///
/// Fields are mutated only by the transition handlers; everything else reads
/// through the accessors. All transitions are monotone: no flag ever flips
/// back, no bid record is ever removed.
#[derive(Debug)]
pub struct AuctionLedger {
    pub(crate) config: AuctionConfig,

    /// The creating caller; the only identity allowed to end the auction
    pub(crate) seller: Address,

    /// Fixed at creation, never mutated
    pub(crate) bidding_end: u64,

    pub(crate) ended: bool,
    pub(crate) reveal_pending: bool,
    pub(crate) reveal_finalized: bool,

    /// Running highest bid, opaque; zero sentinel before any bid
    pub(crate) highest_bid: CiphertextHandle,

    /// Running highest bidder's registry ordinal, opaque
    pub(crate) highest_bidder: CiphertextHandle,

    /// Acceptance-ordered bidder registry; one entry per accepted bid
    pub(crate) bidders: Vec<Address>,

    pub(crate) bids: HashMap<Address, BidRecord>,

    /// Marker for the single outstanding decryption request
    pub(crate) outstanding_request: Option<RequestId>,

    /// Valid only once `reveal_finalized`
    pub(crate) winner: Option<Winner>,
}

impl AuctionLedger {
    // =========================
    // QUERY SURFACE (read-only)
    // =========================

    pub fn auction_id(&self) -> &Address {
        &self.config.auction_id
    }

    pub fn seller(&self) -> &Address {
        &self.seller
    }

    pub fn item(&self) -> &ItemMetadata {
        &self.config.item
    }

    pub fn item_name(&self) -> &str {
        &self.config.item.name
    }

    pub fn item_description(&self) -> &str {
        &self.config.item.description
    }

    pub fn item_image_url(&self) -> &str {
        &self.config.item.image_url
    }

    pub fn bidding_end(&self) -> u64 {
        self.bidding_end
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn reveal_pending(&self) -> bool {
        self.reveal_pending
    }

    pub fn reveal_finalized(&self) -> bool {
        self.reveal_finalized
    }

    pub fn phase(&self) -> AuctionPhase {
        if self.reveal_finalized {
            AuctionPhase::RevealFinalized
        } else if self.reveal_pending {
            AuctionPhase::RevealPending
        } else if self.ended {
            AuctionPhase::Ended
        } else {
            AuctionPhase::Active
        }
    }

    pub fn bidder_count(&self) -> usize {
        self.bidders.len()
    }

    /// Bidders in acceptance order.
    pub fn bidders(&self) -> &[Address] {
        &self.bidders
    }

    pub fn has_bid(&self, identity: &Address) -> bool {
        self.bids.contains_key(identity)
    }

    /// The caller's own sealed bid handle, if they bid.
    pub fn encrypted_bid(&self, identity: &Address) -> Option<CiphertextHandle> {
        self.bids.get(identity).map(|record| record.handle)
    }

    pub fn bid_record(&self, identity: &Address) -> Option<&BidRecord> {
        self.bids.get(identity)
    }

    /// The disclosed winner.
    ///
    /// Fails with `NotRevealed` until the reveal is finalized.
    pub fn winner(&self) -> Result<&Winner, AuctionError> {
        if !self.reveal_finalized {
            return Err(AuctionError::NotRevealed);
        }
        // Set by commit_winner before the flag flips.
        Ok(self.winner.as_ref().expect("finalized without winner"))
    }

    /// The marker for the single outstanding decryption request.
    pub fn outstanding_request(&self) -> Option<&RequestId> {
        self.outstanding_request.as_ref()
    }

    // =========================
    // REVEAL COMMIT
    // =========================

    /// Commit the authorized reveal result.
    ///
    /// Called by the reveal coordinator after it has authenticated the
    /// callback. Guarded against replay: once finalized, every further
    /// commit fails and state is untouched.
    pub fn commit_winner(
        &mut self,
        request_id: &RequestId,
        winner: Winner,
    ) -> Result<(), AuctionError> {
        if self.reveal_finalized {
            return Err(AuctionError::RevealReplayed);
        }
        if !self.reveal_pending {
            return Err(AuctionError::RevealNotPending);
        }
        match self.outstanding_request {
            Some(outstanding) if outstanding == *request_id => {}
            _ => return Err(AuctionError::RequestMismatch),
        }

        self.winner = Some(winner);
        self.reveal_finalized = true;
        Ok(())
    }
}
