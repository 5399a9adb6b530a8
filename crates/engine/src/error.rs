//! Engine error types.

use thiserror::Error;

use shielded_crypto::CryptoError;

/// Errors that can occur inside the encryption service.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown ciphertext handle")]
    UnknownHandle,

    #[error("Handle does not reference a boolean")]
    NotABoolean,

    #[error("Handle does not reference a 64-bit value")]
    NotANumber,

    #[error("Cryptographic failure: {0}")]
    Crypto(#[from] CryptoError),
}
