//! Identity addresses and their canonical checksummed rendering.
//!
//! Every identity in the system (seller, bidder, the auction itself, the
//! decryption oracle) is a 20-byte address. The canonical textual form is a
//! mixed-case hex string whose letter casing is derived from a SHA-256 digest
//! of the lowercase rendering; parsing accepts all-lowercase and all-uppercase
//! input but rejects mixed-case input whose casing does not match.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors produced while parsing an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("expected 40 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character in address")]
    InvalidHex,

    #[error("mixed-case address fails checksum")]
    ChecksumMismatch,
}

/// A 20-byte identity address.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize,
    BorshDeserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The defined empty sentinel.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse an address from hex, with or without a `0x` prefix.
    ///
    /// Mixed-case input is treated as checksummed and must match the
    /// canonical casing exactly.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let body = input.strip_prefix("0x").unwrap_or(input);
        if body.len() != 40 {
            return Err(AddressError::InvalidLength(body.len()));
        }

        let bytes = hex::decode(body).map_err(|_| AddressError::InvalidHex)?;
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&bytes);
        let address = Self(raw);

        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && body != address.checksum_body() {
            return Err(AddressError::ChecksumMismatch);
        }

        Ok(address)
    }

    /// Canonical checksummed rendering, `0x`-prefixed.
    pub fn to_checksum(&self) -> String {
        format!("0x{}", self.checksum_body())
    }

    fn checksum_body(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Sha256::digest(lower.as_bytes());

        lower
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if !c.is_ascii_alphabetic() {
                    return c;
                }
                let byte = digest[i / 2];
                let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                if nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Serde carries addresses in their canonical checksummed rendering; borsh
// keeps the raw 20 bytes for wire types.
impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rendered = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse(&rendered).map_err(serde::de::Error::custom)
    }
}
