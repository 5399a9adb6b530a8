//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid G1 point encoding")]
    InvalidG1Point,

    #[error("Invalid G2 point encoding")]
    InvalidG2Point,

    #[error("Invalid scalar encoding")]
    InvalidScalar,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Invalid payload format")]
    InvalidPayloadFormat,

    #[error("Invalid commitment")]
    InvalidCommitment,

    #[error("Key derivation failed")]
    KeyDerivationFailed,
}
