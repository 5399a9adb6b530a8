//! Reveal Coordinator
//!
//! Bridges the ledger's terminal state to the external decryption service:
//!
//! 1. Dispatches exactly one decryption request when the auction ends
//! 2. Holds the single outstanding-request marker
//! 3. Authenticates the service's one-time callback (allowlisted responder
//!    plus attestation MAC)
//! 4. Commits the disclosed winner into the ledger, guarded against replay
//!
//! There is no timeout and no retry: if the service never responds, the
//! auction stays `RevealPending` indefinitely.

use thiserror::Error;
use tracing::{info, warn};

use shielded_ledger::{AuctionError, AuctionLedger};
use shielded_types::{Address, AttestationKey, RequestId, RevealRequest, RevealResponse, Winner};

/// Errors that can occur while coordinating the reveal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("A reveal request is already outstanding")]
    AlreadyDispatched,

    #[error("No reveal request outstanding")]
    NoOutstandingRequest,

    #[error("Response does not correspond to the outstanding request")]
    UnknownRequest,

    #[error("Response is not from the authorized decryption service")]
    UnauthorizedResponse,

    #[error("Reveal already finalized")]
    ReplayedResponse,

    #[error("Ledger rejected the reveal: {0}")]
    Ledger(#[from] AuctionError),
}

/// The external decryption service, seen from the coordinator.
///
/// Submission only queues work; fulfilment arrives later (or never) as a
/// `RevealResponse` through `RevealCoordinator::finalize`.
pub trait DecryptionOracle {
    fn submit(&mut self, request: RevealRequest);
}

/// Coordinates the one-shot disclosure of the winning bid.
pub struct RevealCoordinator {
    /// The only identity whose callbacks are accepted
    oracle_id: Address,
    /// Shared secret for authenticating callbacks
    attestation_key: AttestationKey,
    /// Marker for the single outstanding request
    outstanding: Option<RequestId>,
}

impl RevealCoordinator {
    /// Create a coordinator bound to an authorized decryption service.
    pub fn new(oracle_id: Address, attestation_key: AttestationKey) -> Self {
        Self {
            oracle_id,
            attestation_key,
            outstanding: None,
        }
    }

    /// The outstanding request marker, if any.
    pub fn outstanding(&self) -> Option<&RequestId> {
        self.outstanding.as_ref()
    }

    /// Dispatch the decryption request produced by ending the auction.
    ///
    /// At most one request is ever dispatched; a second attempt fails without
    /// contacting the oracle.
    pub fn dispatch<O: DecryptionOracle>(
        &mut self,
        oracle: &mut O,
        request: RevealRequest,
    ) -> Result<RequestId, CoordinatorError> {
        if self.outstanding.is_some() {
            return Err(CoordinatorError::AlreadyDispatched);
        }

        let request_id = request.request_id;
        self.outstanding = Some(request_id);
        oracle.submit(request);

        info!(request_id = %request_id, "Dispatched reveal request");

        Ok(request_id)
    }

    /// Commit an authorized reveal callback.
    ///
    /// `responder` is the authenticated identity delivering the response.
    /// Rejections leave both coordinator and ledger untouched.
    pub fn finalize(
        &mut self,
        ledger: &mut AuctionLedger,
        responder: &Address,
        response: RevealResponse,
    ) -> Result<Winner, CoordinatorError> {
        if ledger.reveal_finalized() {
            warn!(request_id = %response.request_id, "Rejected replayed reveal callback");
            return Err(CoordinatorError::ReplayedResponse);
        }

        let outstanding = self
            .outstanding
            .ok_or(CoordinatorError::NoOutstandingRequest)?;
        if response.request_id != outstanding {
            warn!(
                request_id = %response.request_id,
                outstanding = %outstanding,
                "Rejected reveal callback for unknown request"
            );
            return Err(CoordinatorError::UnknownRequest);
        }

        if *responder != self.oracle_id {
            warn!(responder = %responder, "Rejected reveal callback from unauthorized responder");
            return Err(CoordinatorError::UnauthorizedResponse);
        }
        if !self.attestation_key.verify(&response) {
            warn!(request_id = %response.request_id, "Rejected reveal callback with bad attestation");
            return Err(CoordinatorError::UnauthorizedResponse);
        }

        // The decrypted ordinal indexes the registry; anything out of range
        // (including the no-bid sentinel) resolves to the zero address.
        let bidder = ledger
            .bidders()
            .get(response.bidder_index as usize)
            .copied()
            .unwrap_or(Address::ZERO);

        let winner = Winner {
            bidder,
            amount: response.amount,
        };

        ledger.commit_winner(&outstanding, winner.clone())?;

        info!(
            request_id = %outstanding,
            winner = %winner.bidder,
            amount = winner.amount,
            "Reveal finalized"
        );

        Ok(winner)
    }
}
