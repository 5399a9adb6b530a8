//! Client-facing surface of the encryption service.

use thiserror::Error;

use shielded_types::{CiphertextHandle, EncryptedInput, G2Point};

/// Public parameters a client needs to seal a bid.
#[derive(Clone, Debug)]
pub struct ServiceParams {
    /// The service public key (SPK = s * G2)
    pub service_key: G2Point,
}

/// Errors surfaced across the gateway boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Encryption service unreachable: {0}")]
    Unreachable(String),

    #[error("Input rejected by the encryption service: {0}")]
    Rejected(String),
}

/// The encryption service as seen by a bidding client.
///
/// Registration hands the ciphertext to the service and returns the opaque
/// handle the ledger will accept; the plaintext amount never crosses this
/// boundary.
pub trait InputGateway {
    fn service_params(&self) -> Result<ServiceParams, GatewayError>;

    fn register_input(&mut self, input: EncryptedInput) -> Result<CiphertextHandle, GatewayError>;
}
