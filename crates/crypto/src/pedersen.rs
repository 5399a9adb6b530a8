//! Pedersen commitments on BLS12-381 G1.
//!
//! A Pedersen commitment C = g^v * h^r is:
//! - **Hiding**: Given C, cannot determine v without r
//! - **Binding**: Cannot find different (v', r') with same C
//!
//! A bidder commits to the bid value at sealing time; the commitment travels
//! with the inclusion proof and is checked against the decrypted opening.

use bls12_381::{G1Affine, G1Projective, Scalar};
use group::Curve;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use shielded_types::{PedersenCommitment, Scalar as TypesScalar};

use crate::error::CryptoError;
use crate::ibe::compress_g1;

/// Parameters for Pedersen commitments.
pub struct PedersenParams {
    /// Base point g
    pub g: G1Affine,
    /// Base point h (nothing-up-my-sleeve generation)
    pub h: G1Affine,
}

impl Default for PedersenParams {
    fn default() -> Self {
        Self::new()
    }
}

impl PedersenParams {
    /// Create new Pedersen parameters with standard bases.
    pub fn new() -> Self {
        Self {
            g: G1Affine::generator(),
            h: derive_h_point(),
        }
    }
}

/// Derive the h point using a nothing-up-my-sleeve method.
fn derive_h_point() -> G1Affine {
    let mut hasher = Sha256::new();
    hasher.update(b"SHIELDED_PEDERSEN_H_BLS12381_V1");
    let hash = hasher.finalize();

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);

    let scalar = Scalar::from_bytes(&bytes);
    if scalar.is_some().into() {
        (G1Projective::generator() * scalar.unwrap()).to_affine()
    } else {
        // Unreachable with an honest hash, but keep a fixed fallback.
        (G1Projective::generator() * Scalar::from(12345u64)).to_affine()
    }
}

/// Create a Pedersen commitment to a value.
///
/// Returns the commitment together with the blinding randomness the opener
/// will need.
pub fn pedersen_commit<R: RngCore + CryptoRng>(
    params: &PedersenParams,
    value: u64,
    rng: &mut R,
) -> (PedersenCommitment, TypesScalar) {
    let mut rand_bytes = [0u8; 64];
    rng.fill_bytes(&mut rand_bytes);
    let randomness = Scalar::from_bytes_wide(&rand_bytes);

    // C = g^value * h^randomness
    let commitment_point = (G1Projective::from(params.g) * Scalar::from(value)
        + G1Projective::from(params.h) * randomness)
        .to_affine();

    (
        PedersenCommitment {
            point: compress_g1(&commitment_point),
        },
        TypesScalar(randomness.to_bytes()),
    )
}

/// Reconstruct a commitment from a claimed opening.
fn pedersen_commit_with_randomness(
    params: &PedersenParams,
    value: u64,
    randomness: &TypesScalar,
) -> Result<PedersenCommitment, CryptoError> {
    let r = Scalar::from_bytes(&randomness.0);
    if r.is_none().into() {
        return Err(CryptoError::InvalidScalar);
    }

    let commitment_point = (G1Projective::from(params.g) * Scalar::from(value)
        + G1Projective::from(params.h) * r.unwrap())
    .to_affine();

    Ok(PedersenCommitment {
        point: compress_g1(&commitment_point),
    })
}

/// Verify a Pedersen commitment opening.
pub fn pedersen_verify(
    params: &PedersenParams,
    commitment: &PedersenCommitment,
    value: u64,
    randomness: &TypesScalar,
) -> Result<(), CryptoError> {
    let expected = pedersen_commit_with_randomness(params, value, randomness)?;

    if commitment.point == expected.point {
        Ok(())
    } else {
        Err(CryptoError::InvalidCommitment)
    }
}
