//! Opaque highest-bid folding.
//!
//! Invoked once per accepted bid. The comparison and both selections are
//! evaluated inside the encryption service; the ledger only ever shuffles
//! handles. Tie policy: strictly-greater replaces, so among equal maximum
//! bids the earliest accepted bidder stays recorded.

use shielded_types::CiphertextHandle;

use crate::ops::{OpaqueOps, OpsError};

/// Fold a newly accepted bid into the running `(highest_bid, highest_bidder)`
/// pair.
///
/// `ordinal` is the candidate's position in the bidder registry. The first
/// accepted bid replaces the zero sentinel unconditionally; every later bid
/// replaces only on strict improvement. Applied uniformly, including for a
/// lone bidder.
pub fn fold_highest<O: OpaqueOps + ?Sized>(
    ops: &mut O,
    highest_bid: &CiphertextHandle,
    highest_bidder: &CiphertextHandle,
    candidate: &CiphertextHandle,
    ordinal: u64,
) -> Result<(CiphertextHandle, CiphertextHandle), OpsError> {
    let strictly_higher = ops.gt(candidate, highest_bid)?;
    let first = ops.trivial_bool(ordinal == 0)?;
    let adopt = ops.or(&strictly_higher, &first)?;

    let candidate_ordinal = ops.trivial_u64(ordinal)?;

    let next_bid = ops.select(&adopt, candidate, highest_bid)?;
    let next_bidder = ops.select(&adopt, &candidate_ordinal, highest_bidder)?;

    Ok((next_bid, next_bidder))
}
