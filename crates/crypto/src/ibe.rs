//! Identity-based encryption on BLS12-381 pairings.
//!
//! A bid sealed for identity `id` can only be opened by the holder of the
//! master secret, via the identity-specific key `sigma = s * H(id)`:
//!
//! Encryption of message `m` to identity `id`:
//! 1. Compute id_hash = H_1(id) in G1
//! 2. Sample random scalar r
//! 3. Compute U = r * G2 (ephemeral public key)
//! 4. Compute shared = e(id_hash, SPK)^r
//! 5. Derive a symmetric key from shared
//! 6. Encrypt m with AES-GCM
//!
//! Decryption with `sigma`:
//! 1. Compute shared = e(sigma, U)
//! 2. Derive the symmetric key
//! 3. Decrypt with AES-GCM

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use bls12_381::{pairing, G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use group::Curve;
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use shielded_types::{G1Point, G2Point, SealedCiphertext};

use crate::error::CryptoError;

/// The encryption service's public key (SPK = s * G2).
pub struct ServicePublicKey {
    spk: G2Affine,
}

impl ServicePublicKey {
    /// Parse a service public key from its compressed encoding.
    pub fn from_g2_point(point: &G2Point) -> Result<Self, CryptoError> {
        Ok(Self {
            spk: decompress_g2(&point.0)?,
        })
    }

    pub fn to_g2_point(&self) -> G2Point {
        compress_g2(&self.spk)
    }
}

/// Sample a fresh master secret.
pub fn random_master_secret<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    random_scalar(rng)
}

/// Derive the service public key from the master secret.
pub fn master_public_key(master_secret: &Scalar) -> G2Point {
    compress_g2(&(G2Projective::generator() * master_secret).to_affine())
}

/// Derive the decryption key for an identity: sigma = s * H(id).
///
/// Only the encryption service holds the master secret, so this is the one
/// place a binding can be opened.
pub fn derive_decryption_key(master_secret: &Scalar, identity: &[u8]) -> G1Point {
    let id_hash = hash_to_g1(identity);
    compress_g1(&(G1Projective::from(id_hash) * master_secret).to_affine())
}

/// Encrypt a message to an identity under the service public key.
pub fn encrypt<R: RngCore + CryptoRng>(
    service_key: &ServicePublicKey,
    identity: &[u8],
    plaintext: &[u8],
    rng: &mut R,
) -> Result<SealedCiphertext, CryptoError> {
    // Hash identity to G1 and sample the ephemeral exponent
    let id_hash = hash_to_g1(identity);
    let r = random_scalar(rng);

    let u = (G2Projective::generator() * r).to_affine();

    // Shared secret: e(H(id), SPK)^r = e(r * H(id), SPK)
    let r_id_hash = (id_hash * r).to_affine();
    let shared_gt = pairing(&r_id_hash, &service_key.spk);

    let key = derive_key_from_gt(&shared_gt)?;

    let mut nonce_bytes = [0u8; 12];
    rng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| CryptoError::EncryptionFailed(format!("Failed to create cipher: {}", e)))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext_with_tag = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(format!("AES-GCM encryption failed: {}", e)))?;

    // Split ciphertext and tag
    let tag_start = ciphertext_with_tag.len() - 16;
    let ciphertext = ciphertext_with_tag[..tag_start].to_vec();
    let mut tag = [0u8; 16];
    tag.copy_from_slice(&ciphertext_with_tag[tag_start..]);

    Ok(SealedCiphertext {
        ephemeral_pubkey: compress_g2(&u),
        ciphertext,
        tag,
        nonce: nonce_bytes,
    })
}

/// Decrypt a sealed ciphertext with an identity-specific decryption key.
///
/// Fails with `AuthenticationFailed` when the key was derived for a
/// different identity than the ciphertext was sealed to.
pub fn decrypt(
    ciphertext: &SealedCiphertext,
    decryption_key: &G1Point,
) -> Result<Vec<u8>, CryptoError> {
    let sigma = decompress_g1(&decryption_key.0)?;
    let u = decompress_g2(&ciphertext.ephemeral_pubkey.0)?;

    // e(sigma, U) = e(s * H(id), r * G2) = e(H(id), SPK)^r
    let shared_gt = pairing(&sigma, &u);

    let key = derive_key_from_gt(&shared_gt)?;

    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| CryptoError::DecryptionFailed(format!("Failed to create cipher: {}", e)))?;

    let nonce = Nonce::from_slice(&ciphertext.nonce);

    let mut ct_with_tag = ciphertext.ciphertext.clone();
    ct_with_tag.extend_from_slice(&ciphertext.tag);

    cipher
        .decrypt(nonce, ct_with_tag.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailed)
}

/// Hash arbitrary data to a G1 point.
pub fn hash_to_g1(data: &[u8]) -> G1Affine {
    // Simplified hash-to-curve using try-and-increment
    use sha2::{Digest, Sha256};

    let mut counter = 0u64;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(b"BLS12381G1_XMD:SHA-256_SSWU_RO_");
        hasher.update(data);
        hasher.update(counter.to_le_bytes());
        let hash = hasher.finalize();

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash[..32]);

        let scalar = Scalar::from_bytes(&bytes);
        if scalar.is_some().into() {
            let point = G1Projective::generator() * scalar.unwrap();
            return point.to_affine();
        }
        counter += 1;
    }
}

/// Generate a random scalar.
pub(crate) fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; 64];
    rng.fill_bytes(&mut bytes);
    Scalar::from_bytes_wide(&bytes)
}

/// Derive a symmetric key from a GT element.
fn derive_key_from_gt(gt: &bls12_381::Gt) -> Result<[u8; 32], CryptoError> {
    use sha2::Digest;

    // GT elements are large (576 bytes); hash the debug encoding down before
    // feeding HKDF, matching the service's key schedule on both sides.
    let mut hasher = sha2::Sha256::new();
    hasher.update(format!("{:?}", gt).as_bytes());
    let gt_bytes = hasher.finalize();

    let hk = Hkdf::<Sha256>::new(None, &gt_bytes);
    let mut key = [0u8; 32];
    hk.expand(b"SEALED-BID-KEY", &mut key)
        .map_err(|_| CryptoError::KeyDerivationFailed)?;

    Ok(key)
}

/// Compress a G1 point to bytes.
pub fn compress_g1(point: &G1Affine) -> G1Point {
    G1Point(point.to_compressed())
}

/// Decompress a G1 point from bytes.
pub fn decompress_g1(bytes: &[u8; 48]) -> Result<G1Affine, CryptoError> {
    let point = G1Affine::from_compressed(bytes);
    if point.is_some().into() {
        Ok(point.unwrap())
    } else {
        Err(CryptoError::InvalidG1Point)
    }
}

/// Compress a G2 point to bytes.
pub fn compress_g2(point: &G2Affine) -> G2Point {
    G2Point(point.to_compressed())
}

/// Decompress a G2 point from bytes.
pub fn decompress_g2(bytes: &[u8; 96]) -> Result<G2Affine, CryptoError> {
    let point = G2Affine::from_compressed(bytes);
    if point.is_some().into() {
        Ok(point.unwrap())
    } else {
        Err(CryptoError::InvalidG2Point)
    }
}
