//! Core type definitions for the shielded sealed-bid auction.
//!
//! This crate provides the shared data structures used across the auction
//! system: identities, item metadata, ciphertext handles, sealed ciphertexts,
//! commitments, and the reveal request/response types.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

pub mod address;

pub use address::{Address, AddressError};

// =========================
// CRYPTOGRAPHIC PRIMITIVES
// =========================

/// Compressed G1 point on BLS12-381 (48 bytes)
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct G1Point(#[serde_as(as = "[_; 48]")] pub [u8; 48]);

impl Default for G1Point {
    fn default() -> Self {
        Self([0u8; 48])
    }
}

/// Compressed G2 point on BLS12-381 (96 bytes)
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct G2Point(#[serde_as(as = "[_; 96]")] pub [u8; 96]);

impl Default for G2Point {
    fn default() -> Self {
        Self([0u8; 96])
    }
}

/// Scalar field element (32 bytes, little-endian)
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Scalar(pub [u8; 32]);

impl Default for Scalar {
    fn default() -> Self {
        Self([0u8; 32])
    }
}

/// Pedersen commitment: C = g^value * h^randomness
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct PedersenCommitment {
    pub point: G1Point,
}

// =========================
// SEALED BIDS
// =========================

/// Opaque reference to an encrypted value held by the encryption service.
///
/// A handle carries no plaintext and is meaningless outside the
/// `(auction, bidder)` binding it was registered under.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct CiphertextHandle(pub [u8; 32]);

impl CiphertextHandle {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// IBE ciphertext of a sealed bid value.
///
/// The AEAD payload is `bid_value (8 LE bytes) || randomness (32 bytes)`,
/// encrypted to the identity derived from the `(auction, bidder)` binding.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct SealedCiphertext {
    /// Ephemeral public key: U = r * G2
    pub ephemeral_pubkey: G2Point,

    /// AES-256-GCM payload, key derived from the pairing
    pub ciphertext: Vec<u8>,

    /// Authentication tag
    pub tag: [u8; 16],

    /// Nonce for AEAD
    pub nonce: [u8; 12],
}

/// Proof that a ciphertext handle was constructed for a specific
/// `(auction, bidder)` pair.
///
/// The commitment opens to the sealed value; the encryption service checks
/// the opening after deriving the binding-specific decryption key, so a
/// handle replayed under a different binding fails authentication.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct InclusionProof {
    pub commitment: PedersenCommitment,
}

/// The material a client registers with the encryption service to obtain a
/// handle.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub ciphertext: SealedCiphertext,
    pub commitment: PedersenCommitment,
    pub auction: Address,
    pub bidder: Address,
}

// =========================
// AUCTION TYPES
// =========================

/// Immutable description of the item under auction, set at creation.
#[derive(Clone, Debug, Default, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub name: String,
    pub description: String,
    pub image_url: String,
}

/// Auction lifecycle phase. All transitions are one-way.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionPhase {
    /// Accepting bids
    Active,
    /// Bidding closed, reveal not yet requested
    Ended,
    /// One decryption request outstanding
    RevealPending,
    /// Winner disclosed
    RevealFinalized,
}

/// A recorded bid: one per bidder, never mutated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BidRecord {
    pub bidder: Address,
    pub handle: CiphertextHandle,
    pub ordinal: u64,
}

/// The disclosed winner, valid only once the reveal is finalized.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Winner {
    pub bidder: Address,
    pub amount: u64,
}

// =========================
// REVEAL PLUMBING
// =========================

/// Identifier of the single outstanding decryption request.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize,
    Deserialize,
)]
pub struct RequestId(pub [u8; 32]);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Decryption request handed to the external service when the auction ends.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealRequest {
    pub request_id: RequestId,
    pub amount: CiphertextHandle,
    pub bidder_index: CiphertextHandle,
}

/// The service's one-time disclosure of the winning bid.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealResponse {
    pub request_id: RequestId,
    pub bidder_index: u64,
    pub amount: u64,
    pub attestation: [u8; 32],
}

/// Shared secret provisioned to both the decryption service and the reveal
/// coordinator, used to authenticate callbacks.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AttestationKey(pub [u8; 32]);

impl AttestationKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// MAC over the disclosed plaintexts, bound to the request.
    pub fn attest(&self, request_id: &RequestId, bidder_index: u64, amount: u64) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"SHIELDED_REVEAL_ATTEST_V1:");
        hasher.update(self.0);
        hasher.update(request_id.0);
        hasher.update(bidder_index.to_le_bytes());
        hasher.update(amount.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn verify(&self, response: &RevealResponse) -> bool {
        self.attest(&response.request_id, response.bidder_index, response.amount)
            == response.attestation
    }
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Compute the encryption identity binding a sealed bid to its auction and
/// bidder.
pub fn bid_binding(auction: &Address, bidder: &Address) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"SHIELDED_BID_BINDING_V1:");
    hasher.update(auction.as_bytes());
    hasher.update(bidder.as_bytes());
    hasher.finalize().into()
}

/// Compute the identifier of a decryption request from the handles it covers.
pub fn reveal_request_id(
    auction: &Address,
    amount: &CiphertextHandle,
    bidder_index: &CiphertextHandle,
) -> RequestId {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"SHIELDED_REVEAL_REQUEST_V1:");
    hasher.update(auction.as_bytes());
    hasher.update(amount.0);
    hasher.update(bidder_index.0);
    RequestId(hasher.finalize().into())
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::Digest;
    sha2::Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_bid_binding_separates_pairs() {
        let b1 = bid_binding(&addr(1), &addr(2));
        let b2 = bid_binding(&addr(1), &addr(3));
        let b3 = bid_binding(&addr(2), &addr(2));

        assert_ne!(b1, b2);
        assert_ne!(b1, b3);
        assert_ne!(b2, b3);
    }

    #[test]
    fn test_reveal_request_id_depends_on_handles() {
        let h1 = CiphertextHandle([1u8; 32]);
        let h2 = CiphertextHandle([2u8; 32]);

        let id1 = reveal_request_id(&addr(1), &h1, &h2);
        let id2 = reveal_request_id(&addr(1), &h2, &h1);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_attestation_round_trip() {
        let key = AttestationKey::from_bytes([7u8; 32]);
        let request_id = RequestId([9u8; 32]);

        let response = RevealResponse {
            request_id,
            bidder_index: 2,
            amount: 500,
            attestation: key.attest(&request_id, 2, 500),
        };
        assert!(key.verify(&response));

        let mut forged = response.clone();
        forged.amount = 501;
        assert!(!key.verify(&forged));

        let other_key = AttestationKey::from_bytes([8u8; 32]);
        assert!(!other_key.verify(&response));
    }

    #[test]
    fn test_handle_serialization() {
        let handle = CiphertextHandle([42u8; 32]);
        let encoded = borsh::to_vec(&handle).unwrap();
        let decoded: CiphertextHandle = borsh::from_slice(&encoded).unwrap();
        assert_eq!(handle, decoded);
    }
}
