//! Session-scoped encryption context and the bid sealing pipeline.

use parking_lot::Mutex;
use rand::rngs::OsRng;
use tracing::debug;

use shielded_crypto::{
    encode_bid_payload, encrypt, pedersen_commit, PedersenParams, ServicePublicKey,
};
use shielded_types::{bid_binding, Address, CiphertextHandle, EncryptedInput, InclusionProof};

use crate::error::ClientError;
use crate::gateway::{InputGateway, ServiceParams};

/// Source of the caller's signing identity.
pub trait IdentityProvider {
    /// The address of the available signing identity, if any.
    fn address(&self) -> Option<Address>;
}

impl IdentityProvider for Address {
    fn address(&self) -> Option<Address> {
        Some(*self)
    }
}

impl IdentityProvider for Option<Address> {
    fn address(&self) -> Option<Address> {
        *self
    }
}

/// The cached, session-scoped encryption context.
#[derive(Clone, Debug)]
pub struct SessionContext {
    /// The signing identity bids are sealed for
    pub signer: Address,
    /// Service parameters fetched at initialization
    pub params: ServiceParams,
}

/// Capability object for sealing bids.
///
/// The context is established lazily on first use and reused sequentially for
/// every later call; the session lock also serializes sealing, so at most one
/// encryption is in flight per client.
pub struct EncryptionClient<P> {
    provider: P,
    session: Mutex<Option<SessionContext>>,
}

impl<P: IdentityProvider> EncryptionClient<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            session: Mutex::new(None),
        }
    }

    /// Establish the session context, or return the cached one.
    ///
    /// Fails with `NoIdentity` when the provider has no signing identity and
    /// `ServiceUnreachable` when the gateway cannot supply service
    /// parameters. Neither failure is cached; a later call retries.
    pub fn initialize<G: InputGateway>(&self, gateway: &G) -> Result<SessionContext, ClientError> {
        let mut slot = self.session.lock();
        self.context(&mut slot, gateway)
    }

    fn context<G: InputGateway>(
        &self,
        slot: &mut Option<SessionContext>,
        gateway: &G,
    ) -> Result<SessionContext, ClientError> {
        if let Some(ctx) = slot.as_ref() {
            return Ok(ctx.clone());
        }

        let signer = self.provider.address().ok_or(ClientError::NoIdentity)?;
        let params = gateway.service_params()?;

        let ctx = SessionContext { signer, params };
        *slot = Some(ctx.clone());

        debug!(signer = %ctx.signer, "Initialized encryption session");

        Ok(ctx)
    }

    /// Seal a bid amount for `(auction, bidder)` and register it with the
    /// encryption service, returning the opaque handle and inclusion proof
    /// the ledger expects.
    ///
    /// Both identities are parsed to canonical checksummed form before the
    /// binding is computed; a binding built from a differently-rendered
    /// identity would fail proof verification at submission. The bidder must
    /// be the session's signing identity. The plaintext amount never crosses
    /// the gateway boundary.
    pub fn encrypt_bid<G: InputGateway>(
        &self,
        gateway: &mut G,
        value: u64,
        auction: &str,
        bidder: &str,
    ) -> Result<(CiphertextHandle, InclusionProof), ClientError> {
        // Held for the whole pipeline: one in-flight encryption per session.
        let mut slot = self.session.lock();
        let ctx = self.context(&mut slot, gateway)?;

        let auction = Address::parse(auction)?;
        let bidder = Address::parse(bidder)?;
        if bidder != ctx.signer {
            return Err(ClientError::NotSessionIdentity);
        }

        let mut rng = OsRng;
        let service_key = ServicePublicKey::from_g2_point(&ctx.params.service_key)?;

        let pedersen = PedersenParams::new();
        let (commitment, randomness) = pedersen_commit(&pedersen, value, &mut rng);

        let identity = bid_binding(&auction, &bidder);
        let payload = encode_bid_payload(value, &randomness);
        let ciphertext = encrypt(&service_key, &identity, &payload, &mut rng)?;

        let handle = gateway.register_input(EncryptedInput {
            ciphertext,
            commitment: commitment.clone(),
            auction,
            bidder,
        })?;

        debug!(handle = %handle, auction = %auction, "Registered sealed bid");

        Ok((handle, InclusionProof { commitment }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use bls12_381::Scalar as BlsScalar;
    use shielded_crypto::ibe::random_master_secret;
    use shielded_crypto::{
        decode_bid_payload, decrypt, derive_decryption_key, master_public_key, pedersen_verify,
    };
    use shielded_types::{sha256, AddressError, G2Point};

    use crate::gateway::GatewayError;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    /// Gateway double backed by a locally-held master secret.
    struct MockGateway {
        master_secret: BlsScalar,
        service_key: G2Point,
        registered: Vec<EncryptedInput>,
        params_calls: Cell<u32>,
        unreachable: bool,
    }

    impl MockGateway {
        fn new() -> Self {
            let mut rng = OsRng;
            let master_secret = random_master_secret(&mut rng);
            let service_key = master_public_key(&master_secret);
            Self {
                master_secret,
                service_key,
                registered: Vec::new(),
                params_calls: Cell::new(0),
                unreachable: false,
            }
        }
    }

    impl InputGateway for MockGateway {
        fn service_params(&self) -> Result<ServiceParams, GatewayError> {
            if self.unreachable {
                return Err(GatewayError::Unreachable("connection refused".to_string()));
            }
            self.params_calls.set(self.params_calls.get() + 1);
            Ok(ServiceParams {
                service_key: self.service_key.clone(),
            })
        }

        fn register_input(
            &mut self,
            input: EncryptedInput,
        ) -> Result<CiphertextHandle, GatewayError> {
            let handle = CiphertextHandle(sha256(&input.ciphertext.ciphertext));
            self.registered.push(input);
            Ok(handle)
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let gateway = MockGateway::new();
        let client = EncryptionClient::new(addr(2));

        let first = client.initialize(&gateway).unwrap();
        let second = client.initialize(&gateway).unwrap();

        assert_eq!(first.signer, second.signer);
        assert_eq!(gateway.params_calls.get(), 1);
    }

    #[test]
    fn test_initialize_without_identity() {
        let gateway = MockGateway::new();
        let client = EncryptionClient::new(None::<Address>);

        let result = client.initialize(&gateway);
        assert!(matches!(result, Err(ClientError::NoIdentity)));
    }

    #[test]
    fn test_initialize_unreachable_service() {
        let mut gateway = MockGateway::new();
        gateway.unreachable = true;
        let client = EncryptionClient::new(addr(2));

        let result = client.initialize(&gateway);
        assert!(matches!(result, Err(ClientError::ServiceUnreachable(_))));
    }

    #[test]
    fn test_encrypt_bid_seals_and_registers() {
        let mut gateway = MockGateway::new();
        let auction = addr(9);
        let bidder = addr(2);
        let client = EncryptionClient::new(bidder);

        let (_, proof) = client
            .encrypt_bid(
                &mut gateway,
                1_000,
                &auction.to_checksum(),
                &bidder.to_checksum(),
            )
            .unwrap();

        // The gateway received the canonical binding, and only the service's
        // binding-specific key opens the payload.
        let input = &gateway.registered[0];
        assert_eq!(input.auction, auction);
        assert_eq!(input.bidder, bidder);

        let identity = bid_binding(&auction, &bidder);
        let sigma = derive_decryption_key(&gateway.master_secret, &identity);
        let payload = decrypt(&input.ciphertext, &sigma).unwrap();
        let (value, randomness) = decode_bid_payload(&payload).unwrap();

        assert_eq!(value, 1_000);
        assert!(pedersen_verify(
            &PedersenParams::new(),
            &proof.commitment,
            value,
            &randomness
        )
        .is_ok());
    }

    #[test]
    fn test_encrypt_bid_does_not_leak_plaintext() {
        let mut gateway = MockGateway::new();
        let bidder = addr(2);
        let client = EncryptionClient::new(bidder);

        let value = 0x1122334455667788u64;
        client
            .encrypt_bid(
                &mut gateway,
                value,
                &addr(9).to_checksum(),
                &bidder.to_checksum(),
            )
            .unwrap();

        let ciphertext = &gateway.registered[0].ciphertext.ciphertext;
        let le = value.to_le_bytes();
        assert!(!ciphertext.windows(le.len()).any(|w| w == le));
    }

    #[test]
    fn test_encrypt_bid_accepts_any_canonical_casing() {
        let mut gateway = MockGateway::new();
        let bidder = addr(2);
        let client = EncryptionClient::new(bidder);

        let auction_lower = format!("0x{}", hex::encode([9u8; 20]));
        let bidder_upper = format!("0x{}", hex::encode([2u8; 20]).to_uppercase());

        client
            .encrypt_bid(&mut gateway, 500, &auction_lower, &bidder_upper)
            .unwrap();

        assert_eq!(gateway.registered[0].auction, addr(9));
        assert_eq!(gateway.registered[0].bidder, bidder);
    }

    #[test]
    fn test_encrypt_bid_rejects_corrupted_checksum() {
        let mut gateway = MockGateway::new();
        let bidder = addr(0xab);
        let client = EncryptionClient::new(bidder);

        // Mixed-case rendering with one letter's case flipped.
        let canonical = bidder.to_checksum();
        let corrupted = flip_first_letter_case(&canonical);

        let result = client.encrypt_bid(&mut gateway, 500, &addr(9).to_checksum(), &corrupted);
        assert!(matches!(
            result,
            Err(ClientError::InvalidIdentity(AddressError::ChecksumMismatch))
        ));
        assert!(gateway.registered.is_empty());
    }

    #[test]
    fn test_encrypt_bid_rejects_foreign_bidder() {
        let mut gateway = MockGateway::new();
        let client = EncryptionClient::new(addr(2));

        let result = client.encrypt_bid(
            &mut gateway,
            500,
            &addr(9).to_checksum(),
            &addr(3).to_checksum(),
        );
        assert!(matches!(result, Err(ClientError::NotSessionIdentity)));
        assert!(gateway.registered.is_empty());
    }

    fn flip_first_letter_case(rendered: &str) -> String {
        let body = rendered.trim_start_matches("0x");
        let first_letter = body
            .find(|c: char| c.is_ascii_alphabetic())
            .expect("address has no hex letters");
        let flipped: String = body
            .char_indices()
            .map(|(i, c)| {
                if i == first_letter {
                    if c.is_ascii_uppercase() {
                        c.to_ascii_lowercase()
                    } else {
                        c.to_ascii_uppercase()
                    }
                } else {
                    c
                }
            })
            .collect();
        format!("0x{}", flipped)
    }
}
