//! Identity-bound encryption primitives for sealed bids.
//!
//! This crate implements the cryptography behind the opaque bid pipeline:
//!
//! 1. **Setup**: the encryption service holds a master secret `s` and
//!    publishes the service public key `SPK = s * G2`.
//!
//! 2. **Sealing**: a bidder encrypts to the *binding identity* of their bid,
//!    `H(auction || bidder)`, using only `SPK`. The resulting ciphertext can
//!    only be opened with the binding-specific key `sigma = s * H(id)`, which
//!    never leaves the service.
//!
//! 3. **Binding verification**: because the AEAD key is derived from the
//!    binding identity, a ciphertext replayed under a different
//!    `(auction, bidder)` pair fails authentication. A Pedersen commitment to
//!    the sealed value, checked against the decrypted opening, completes the
//!    inclusion proof.
//!
//! 4. **Disclosure**: the service derives `sigma` for an identity it is
//!    authorized to open and decrypts.

pub mod error;
pub mod ibe;
pub mod payload;
pub mod pedersen;

pub use error::CryptoError;
pub use ibe::{decrypt, derive_decryption_key, encrypt, master_public_key, ServicePublicKey};
pub use payload::{decode_bid_payload, encode_bid_payload};
pub use pedersen::{pedersen_commit, pedersen_verify, PedersenParams};
