//! Test support: a plaintext stand-in for the encryption service.
//!
//! `PlainOps` evaluates the opaque operations over values held in the clear,
//! keyed by synthetic handles. It lets ledger and coordinator logic be
//! exercised without the real cryptographic engine.

use std::collections::HashMap;

use shielded_types::{Address, CiphertextHandle, G1Point, InclusionProof, PedersenCommitment};

use crate::ops::{OpaqueOps, OpsError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plain {
    Num(u64),
    Bool(bool),
}

/// An evaluator that stores plaintexts in a map.
#[derive(Default)]
pub struct PlainOps {
    values: HashMap<CiphertextHandle, Plain>,
    bindings: HashMap<CiphertextHandle, (Address, Address)>,
    counter: u64,
}

impl PlainOps {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&mut self, value: Plain) -> CiphertextHandle {
        self.counter += 1;
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&self.counter.to_le_bytes());
        let handle = CiphertextHandle(bytes);
        self.values.insert(handle, value);
        handle
    }

    fn num(&self, handle: &CiphertextHandle) -> Result<u64, OpsError> {
        match self.values.get(handle) {
            Some(Plain::Num(v)) => Ok(*v),
            Some(Plain::Bool(_)) => Err(OpsError::KindMismatch),
            None => Err(OpsError::UnknownHandle),
        }
    }

    fn boolean(&self, handle: &CiphertextHandle) -> Result<bool, OpsError> {
        match self.values.get(handle) {
            Some(Plain::Bool(b)) => Ok(*b),
            Some(Plain::Num(_)) => Err(OpsError::KindMismatch),
            None => Err(OpsError::UnknownHandle),
        }
    }

    /// Register a bid value under a binding, as the encryption client would
    /// through the service gateway.
    pub fn register(
        &mut self,
        auction: Address,
        bidder: Address,
        value: u64,
    ) -> (CiphertextHandle, InclusionProof) {
        let handle = self.mint(Plain::Num(value));
        self.bindings.insert(handle, (auction, bidder));
        (
            handle,
            InclusionProof {
                commitment: PedersenCommitment {
                    point: G1Point::default(),
                },
            },
        )
    }

    /// Read a sealed value back out, for asserting on comparator results.
    pub fn reveal_num(&self, handle: &CiphertextHandle) -> u64 {
        self.num(handle).unwrap()
    }
}

impl OpaqueOps for PlainOps {
    fn trivial_u64(&mut self, value: u64) -> Result<CiphertextHandle, OpsError> {
        Ok(self.mint(Plain::Num(value)))
    }

    fn trivial_bool(&mut self, value: bool) -> Result<CiphertextHandle, OpsError> {
        Ok(self.mint(Plain::Bool(value)))
    }

    fn gt(
        &mut self,
        lhs: &CiphertextHandle,
        rhs: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError> {
        let result = self.num(lhs)? > self.num(rhs)?;
        Ok(self.mint(Plain::Bool(result)))
    }

    fn or(
        &mut self,
        lhs: &CiphertextHandle,
        rhs: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError> {
        let result = self.boolean(lhs)? || self.boolean(rhs)?;
        Ok(self.mint(Plain::Bool(result)))
    }

    fn select(
        &mut self,
        cond: &CiphertextHandle,
        on_true: &CiphertextHandle,
        on_false: &CiphertextHandle,
    ) -> Result<CiphertextHandle, OpsError> {
        let chosen = if self.boolean(cond)? { on_true } else { on_false };
        let value = *self.values.get(chosen).ok_or(OpsError::UnknownHandle)?;
        Ok(self.mint(value))
    }

    fn verify_input(
        &mut self,
        handle: &CiphertextHandle,
        _proof: &InclusionProof,
        auction: &Address,
        bidder: &Address,
    ) -> Result<(), OpsError> {
        let (bound_auction, bound_bidder) =
            self.bindings.get(handle).ok_or(OpsError::UnknownHandle)?;
        if bound_auction != auction || bound_bidder != bidder {
            return Err(OpsError::BindingMismatch);
        }
        Ok(())
    }
}
