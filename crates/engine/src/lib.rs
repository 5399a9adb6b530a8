//! The encryption service behind the shielded auction.
//!
//! `ShieldEngine` plays the role of the trusted external service the rest of
//! the system talks to through narrow interfaces:
//!
//! - For bidders it is the **input gateway**: it ingests sealed ciphertexts
//!   and hands back opaque handles.
//! - For the ledger it is the **opaque evaluator**: comparison and selection
//!   over sealed values, with plaintext touched only inside the engine
//!   boundary and fresh handles minted for every result.
//! - For the reveal coordinator it is the **decryption oracle**: it queues
//!   the one-shot disclosure request and fulfils it, on its own schedule,
//!   with an attested plaintext response.
//!
//! Everything in the engine's store is an IBE ciphertext under the engine's
//! master secret; nothing is held in the clear.

pub mod engine;
pub mod error;

pub use engine::ShieldEngine;
pub use error::EngineError;
