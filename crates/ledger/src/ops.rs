//! Interface to the encryption service's opaque evaluator.
//!
//! The ledger never sees plaintext bid amounts. Every operation on sealed
//! values goes through this trait, and every result comes back as a fresh
//! opaque handle, so ledger state carries no information beyond what the
//! service chooses to disclose at reveal time.

use shielded_types::{Address, CiphertextHandle, InclusionProof};
use thiserror::Error;

/// Errors surfaced by the opaque evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpsError {
    #[error("Unknown ciphertext handle")]
    UnknownHandle,

    #[error("Handle is not bound to this auction and bidder")]
    BindingMismatch,

    #[error("Commitment does not open to the sealed value")]
    CommitmentMismatch,

    #[error("Handle references a value of the wrong kind")]
    KindMismatch,

    #[error("Encryption backend failure: {0}")]
    Backend(String),
}

/// Operations on opaque values, evaluated inside the encryption service.
pub trait OpaqueOps {
    /// Seal a public 64-bit value. Used for the zero sentinel and for bidder
    /// ordinals entering the comparator.
    fn trivial_u64(&mut self, value: u64) -> Result<CiphertextHandle, OpsError>;

    /// Seal a public boolean.
    fn trivial_bool(&mut self, value: bool) -> Result<CiphertextHandle, OpsError>;

    /// Strict greater-than over two sealed 64-bit values; the result is a
    /// sealed boolean.
    fn gt(
        &mut self,
        lhs: &CiphertextHandle,
        rhs: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError>;

    /// Logical or over two sealed booleans.
    fn or(
        &mut self,
        lhs: &CiphertextHandle,
        rhs: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError>;

    /// Conditional selection: the sealed value of `on_true` when `cond` holds,
    /// `on_false` otherwise. Always mints a fresh handle, so the choice is not
    /// observable from handle equality.
    fn select(
        &mut self,
        cond: &CiphertextHandle,
        on_true: &CiphertextHandle,
        on_false: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError>;

    /// Check that `handle` was registered for exactly `(auction, bidder)` and
    /// that `proof` opens to the sealed value.
    fn verify_input(
        &mut self,
        handle: &CiphertextHandle,
        proof: &InclusionProof,
        auction: &Address,
        bidder: &Address,
    ) -> Result<(), OpsError>;
}

