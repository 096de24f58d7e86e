//! Deterministic proposal identity.

use coh_02_canonical::canonical_sha256;
use serde::Serialize;
use shared_types::{Digest, MicroAction, Q18};

use crate::errors::ProposerResult;

/// Identity preimage: the action, its score, and its position in the set.
#[derive(Serialize)]
struct IdPreimage<'a> {
    action: &'a MicroAction,
    score_q: Q18,
    index: u32,
}

/// Compute a proposal's deterministic id.
///
/// Two proposers emitting the same action at the same score and position
/// produce the same id, which is what makes the tie-break reproducible.
pub fn proposal_id(action: &MicroAction, score_q: Q18, index: u32) -> ProposerResult<Digest> {
    let hash = canonical_sha256(&IdPreimage { action, score_q, index })?;
    Ok(Digest(hash))
}
