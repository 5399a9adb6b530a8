//! Call message types for the auction ledger.

use borsh::{BorshDeserialize, BorshSerialize};
use shielded_types::{CiphertextHandle, InclusionProof};

/// State-changing calls accepted by the ledger.
///
/// The reveal callback is not a caller-submitted message; it arrives through
/// the reveal coordinator's authorized path.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    /// Submit a sealed bid: an opaque handle plus the proof binding it to
    /// this auction and the caller.
    Bid {
        handle: CiphertextHandle,
        proof: InclusionProof,
    },

    /// End the auction (seller only, after the bidding deadline).
    EndAuction,
}
