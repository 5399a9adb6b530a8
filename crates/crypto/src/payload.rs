//! Encoding of the sealed bid payload.
//!
//! The plaintext carried by a sealed ciphertext is
//! `bid_value (8 LE bytes) || commitment randomness (32 bytes)`. Shipping the
//! randomness inside the ciphertext lets the decryption service check the
//! Pedersen opening without any extra round trip with the bidder.

use shielded_types::Scalar;

use crate::error::CryptoError;

const PAYLOAD_LEN: usize = 40;

/// Serialize a bid value and its commitment randomness.
pub fn encode_bid_payload(bid_value: u64, randomness: &Scalar) -> Vec<u8> {
    let mut payload = Vec::with_capacity(PAYLOAD_LEN);
    payload.extend_from_slice(&bid_value.to_le_bytes());
    payload.extend_from_slice(&randomness.0);
    payload
}

/// Parse a decrypted bid payload back into `(value, randomness)`.
pub fn decode_bid_payload(payload: &[u8]) -> Result<(u64, Scalar), CryptoError> {
    if payload.len() != PAYLOAD_LEN {
        return Err(CryptoError::InvalidPayloadFormat);
    }

    let bid_value = u64::from_le_bytes(
        payload[..8]
            .try_into()
            .map_err(|_| CryptoError::InvalidPayloadFormat)?,
    );
    let mut randomness = [0u8; 32];
    randomness.copy_from_slice(&payload[8..40]);

    Ok((bid_value, Scalar(randomness)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip() {
        let randomness = Scalar([5u8; 32]);
        let payload = encode_bid_payload(1234, &randomness);
        assert_eq!(payload.len(), PAYLOAD_LEN);

        let (value, parsed) = decode_bid_payload(&payload).unwrap();
        assert_eq!(value, 1234);
        assert_eq!(parsed, randomness);
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let result = decode_bid_payload(&[0u8; 39]);
        assert!(matches!(result, Err(CryptoError::InvalidPayloadFormat)));
    }
}
