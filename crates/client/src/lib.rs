//! Encryption client for the shielded auction.
//!
//! The client turns a plaintext bid amount into an opaque ciphertext handle
//! plus the proof binding it to `(auction, bidder)`. All of this happens
//! before any ledger interaction: by the time a bid is submitted, the amount
//! exists only as an IBE ciphertext held by the encryption service and a
//! hiding commitment travelling with the proof.
//!
//! The session-scoped encryption context (signer identity plus service
//! parameters) is established lazily and cached; repeated initialization is a
//! no-op. The service itself is reached through the [`InputGateway`] trait,
//! which the in-process engine implements.

pub mod error;
pub mod gateway;
pub mod session;

pub use error::ClientError;
pub use gateway::{GatewayError, InputGateway, ServiceParams};
pub use session::{EncryptionClient, IdentityProvider, SessionContext};
