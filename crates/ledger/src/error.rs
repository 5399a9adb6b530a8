//! Auction ledger error types.

use thiserror::Error;

use crate::config::ConfigError;
use crate::ops::OpsError;

/// Errors that can occur in the auction ledger.
///
/// Every variant aborts the mutating operation with no partial state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Bidding is closed")]
    AuctionClosed,

    #[error("Already submitted a bid")]
    AlreadyBid,

    #[error("Inclusion proof does not match the caller's binding")]
    InvalidProof,

    #[error("Only the seller may end the auction")]
    Unauthorized,

    #[error("Bidding deadline not reached")]
    TooEarly,

    #[error("Auction already ended")]
    AlreadyEnded,

    #[error("Winner not revealed yet")]
    NotRevealed,

    #[error("No reveal request outstanding")]
    RevealNotPending,

    #[error("Reveal already finalized")]
    RevealReplayed,

    #[error("Response does not match the outstanding reveal request")]
    RequestMismatch,

    #[error("Invalid auction configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Opaque evaluation failed: {0}")]
    Ops(#[from] OpsError),
}
