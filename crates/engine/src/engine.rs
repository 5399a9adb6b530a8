//! The in-process encryption service.

use std::collections::{HashMap, VecDeque};

use bls12_381::Scalar as BlsScalar;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use reveal_coordinator::DecryptionOracle;
use shielded_client::{GatewayError, InputGateway, ServiceParams};
use shielded_crypto::ibe::random_master_secret;
use shielded_crypto::{
    decode_bid_payload, decrypt, derive_decryption_key, encode_bid_payload, encrypt,
    master_public_key, pedersen_verify, PedersenParams, ServicePublicKey,
};
use shielded_ledger::ops::{OpaqueOps, OpsError};
use shielded_types::{
    bid_binding, Address, AttestationKey, CiphertextHandle, EncryptedInput, G2Point,
    InclusionProof, PedersenCommitment, RevealRequest, RevealResponse, Scalar, SealedCiphertext,
};

use crate::error::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueKind {
    Number,
    Boolean,
}

struct StoredCiphertext {
    ciphertext: SealedCiphertext,
    /// Identity the ciphertext was sealed to
    identity: [u8; 32],
    kind: ValueKind,
    /// Present only for client-registered inputs
    commitment: Option<PedersenCommitment>,
}

/// The trusted encryption/decryption service.
///
/// Holds the master secret; every stored value is an IBE ciphertext and is
/// only ever opened inside engine methods. Results of opaque operations are
/// re-sealed under fresh engine-internal identities, so no handle is ever
/// reused.
pub struct ShieldEngine {
    master_secret: BlsScalar,
    service_key: G2Point,
    oracle_id: Address,
    attestation_key: AttestationKey,
    pedersen: PedersenParams,
    store: HashMap<CiphertextHandle, StoredCiphertext>,
    pending: VecDeque<RevealRequest>,
    minted: u64,
}

impl ShieldEngine {
    /// Stand up a service with a fresh master secret and attestation key.
    pub fn new() -> Self {
        let mut rng = OsRng;

        let master_secret = random_master_secret(&mut rng);
        let service_key = master_public_key(&master_secret);

        // The service identity is derived from its public key.
        let digest = Sha256::digest(service_key.0);
        let mut id_bytes = [0u8; 20];
        id_bytes.copy_from_slice(&digest[..20]);

        let mut attestation_bytes = [0u8; 32];
        rng.fill_bytes(&mut attestation_bytes);

        Self {
            master_secret,
            service_key,
            oracle_id: Address::from_bytes(id_bytes),
            attestation_key: AttestationKey::from_bytes(attestation_bytes),
            pedersen: PedersenParams::new(),
            store: HashMap::new(),
            pending: VecDeque::new(),
            minted: 0,
        }
    }

    /// The identity this service responds from.
    pub fn oracle_id(&self) -> Address {
        self.oracle_id
    }

    /// The callback-authentication secret, for provisioning the coordinator.
    pub fn attestation_key(&self) -> AttestationKey {
        self.attestation_key.clone()
    }

    /// Number of queued, unfulfilled decryption requests.
    pub fn pending_reveals(&self) -> usize {
        self.pending.len()
    }

    /// Fulfil the oldest queued decryption request, if any.
    ///
    /// The service controls its own latency; callers cannot force or cancel
    /// fulfilment. A request that is never fulfilled simply stays queued.
    pub fn fulfill_next(&mut self) -> Result<Option<RevealResponse>, EngineError> {
        let Some(request) = self.pending.pop_front() else {
            return Ok(None);
        };

        let amount = self.open_number(&request.amount)?;
        let bidder_index = self.open_number(&request.bidder_index)?;
        let attestation = self
            .attestation_key
            .attest(&request.request_id, bidder_index, amount);

        info!(request_id = %request.request_id, "Fulfilled decryption request");

        Ok(Some(RevealResponse {
            request_id: request.request_id,
            bidder_index,
            amount,
            attestation,
        }))
    }

    fn seal_internal(&mut self, value: u64, kind: ValueKind) -> Result<CiphertextHandle, EngineError> {
        let mut rng = OsRng;

        self.minted += 1;
        let identity = internal_identity(self.minted);

        // The payload filler takes the slot the client payload uses for
        // commitment randomness; internal values carry no commitment.
        let mut filler = [0u8; 32];
        rng.fill_bytes(&mut filler);
        let payload = encode_bid_payload(value, &Scalar(filler));

        let service_key = ServicePublicKey::from_g2_point(&self.service_key)?;
        let ciphertext = encrypt(&service_key, &identity, &payload, &mut rng)?;

        let handle = internal_handle(self.minted, &identity);
        self.store.insert(
            handle,
            StoredCiphertext {
                ciphertext,
                identity,
                kind,
                commitment: None,
            },
        );

        Ok(handle)
    }

    fn open(&self, handle: &CiphertextHandle) -> Result<(u64, ValueKind), EngineError> {
        let stored = self.store.get(handle).ok_or(EngineError::UnknownHandle)?;

        let sigma = derive_decryption_key(&self.master_secret, &stored.identity);
        let payload = decrypt(&stored.ciphertext, &sigma)?;
        let (value, _) = decode_bid_payload(&payload)?;

        Ok((value, stored.kind))
    }

    fn open_number(&self, handle: &CiphertextHandle) -> Result<u64, EngineError> {
        match self.open(handle)? {
            (value, ValueKind::Number) => Ok(value),
            (_, ValueKind::Boolean) => Err(EngineError::NotANumber),
        }
    }

    fn open_boolean(&self, handle: &CiphertextHandle) -> Result<bool, EngineError> {
        match self.open(handle)? {
            (value, ValueKind::Boolean) => Ok(value != 0),
            (_, ValueKind::Number) => Err(EngineError::NotABoolean),
        }
    }

    #[cfg(test)]
    pub(crate) fn open_number_for_test(&self, handle: &CiphertextHandle) -> u64 {
        self.open_number(handle).unwrap()
    }
}

impl Default for ShieldEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn internal_identity(counter: u64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"SHIELDED_ENGINE_INTERNAL_V1:");
    hasher.update(counter.to_le_bytes());
    hasher.finalize().into()
}

fn internal_handle(counter: u64, identity: &[u8; 32]) -> CiphertextHandle {
    let mut hasher = Sha256::new();
    hasher.update(b"SHIELDED_INTERNAL_HANDLE_V1:");
    hasher.update(counter.to_le_bytes());
    hasher.update(identity);
    CiphertextHandle(hasher.finalize().into())
}

fn input_handle(identity: &[u8; 32], ciphertext: &SealedCiphertext) -> CiphertextHandle {
    let mut hasher = Sha256::new();
    hasher.update(b"SHIELDED_INPUT_HANDLE_V1:");
    hasher.update(identity);
    hasher.update(ciphertext.ephemeral_pubkey.0);
    hasher.update(ciphertext.nonce);
    hasher.update(ciphertext.tag);
    hasher.update(&ciphertext.ciphertext);
    CiphertextHandle(hasher.finalize().into())
}

fn to_ops_error(err: EngineError) -> OpsError {
    match err {
        EngineError::UnknownHandle => OpsError::UnknownHandle,
        EngineError::NotABoolean | EngineError::NotANumber => OpsError::KindMismatch,
        EngineError::Crypto(e) => OpsError::Backend(e.to_string()),
    }
}

impl InputGateway for ShieldEngine {
    fn service_params(&self) -> Result<ServiceParams, GatewayError> {
        Ok(ServiceParams {
            service_key: self.service_key.clone(),
        })
    }

    fn register_input(&mut self, input: EncryptedInput) -> Result<CiphertextHandle, GatewayError> {
        let identity = bid_binding(&input.auction, &input.bidder);
        let handle = input_handle(&identity, &input.ciphertext);

        self.store.insert(
            handle,
            StoredCiphertext {
                ciphertext: input.ciphertext,
                identity,
                kind: ValueKind::Number,
                commitment: Some(input.commitment),
            },
        );

        debug!(handle = %handle, bidder = %input.bidder, "Registered sealed input");

        Ok(handle)
    }
}

impl OpaqueOps for ShieldEngine {
    fn trivial_u64(&mut self, value: u64) -> Result<CiphertextHandle, OpsError> {
        self.seal_internal(value, ValueKind::Number)
            .map_err(to_ops_error)
    }

    fn trivial_bool(&mut self, value: bool) -> Result<CiphertextHandle, OpsError> {
        self.seal_internal(value as u64, ValueKind::Boolean)
            .map_err(to_ops_error)
    }

    fn gt(
        &mut self,
        lhs: &CiphertextHandle,
        rhs: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError> {
        let a = self.open_number(lhs).map_err(to_ops_error)?;
        let b = self.open_number(rhs).map_err(to_ops_error)?;
        self.seal_internal((a > b) as u64, ValueKind::Boolean)
            .map_err(to_ops_error)
    }

    fn or(
        &mut self,
        lhs: &CiphertextHandle,
        rhs: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError> {
        let a = self.open_boolean(lhs).map_err(to_ops_error)?;
        let b = self.open_boolean(rhs).map_err(to_ops_error)?;
        self.seal_internal((a || b) as u64, ValueKind::Boolean)
            .map_err(to_ops_error)
    }

    fn select(
        &mut self,
        cond: &CiphertextHandle,
        on_true: &CiphertextHandle,
        on_false: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError> {
        let condition = self.open_boolean(cond).map_err(to_ops_error)?;
        let chosen = if condition { on_true } else { on_false };

        let (value, kind) = self.open(chosen).map_err(to_ops_error)?;
        self.seal_internal(value, kind).map_err(to_ops_error)
    }

    fn verify_input(
        &mut self,
        handle: &CiphertextHandle,
        proof: &InclusionProof,
        auction: &Address,
        bidder: &Address,
    ) -> Result<(), OpsError> {
        let stored = self.store.get(handle).ok_or(OpsError::UnknownHandle)?;

        let expected = bid_binding(auction, bidder);
        if stored.identity != expected {
            return Err(OpsError::BindingMismatch);
        }

        // Internal handles carry no commitment and are not valid inputs.
        let registered = stored
            .commitment
            .as_ref()
            .ok_or(OpsError::BindingMismatch)?;
        if *registered != proof.commitment {
            return Err(OpsError::CommitmentMismatch);
        }

        let sigma = derive_decryption_key(&self.master_secret, &stored.identity);
        let payload = decrypt(&stored.ciphertext, &sigma).map_err(|_| OpsError::BindingMismatch)?;
        let (value, randomness) =
            decode_bid_payload(&payload).map_err(|e| OpsError::Backend(e.to_string()))?;

        pedersen_verify(&self.pedersen, &proof.commitment, value, &randomness)
            .map_err(|_| OpsError::CommitmentMismatch)?;

        debug!(handle = %handle, bidder = %bidder, "Verified sealed input");

        Ok(())
    }
}

impl DecryptionOracle for ShieldEngine {
    fn submit(&mut self, request: RevealRequest) {
        info!(request_id = %request.request_id, "Queued decryption request");
        self.pending.push_back(request);
    }
}
