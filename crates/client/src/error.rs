//! Client error types.

use thiserror::Error;

use shielded_crypto::CryptoError;
use shielded_types::AddressError;

use crate::gateway::GatewayError;

/// Errors that can occur in the encryption client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No signing identity available")]
    NoIdentity,

    #[error("Encryption service unreachable: {0}")]
    ServiceUnreachable(String),

    #[error("Invalid identity: {0}")]
    InvalidIdentity(#[from] AddressError),

    #[error("Bidder is not the session identity")]
    NotSessionIdentity,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(#[from] CryptoError),

    #[error("Encryption service rejected the input: {0}")]
    Rejected(String),
}

impl From<GatewayError> for ClientError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unreachable(reason) => ClientError::ServiceUnreachable(reason),
            GatewayError::Rejected(reason) => ClientError::Rejected(reason),
        }
    }
}
