//! Inbound port: the proposer contract.

use shared_crypto::DeterministicRng;
use shared_types::{CogState, KernelParams, ProposalSet};

use crate::errors::ProposerResult;

/// A proposal policy, generic over the environment's observation type.
///
/// ## Contract
///
/// - Deterministic over `(self, state, obs, params, rng)`: identical inputs
///   (including internal counters such as visit tables) yield byte-identical
///   proposal sets. The replay verifier reconstructs the proposer and runs
///   it again.
/// - Returns at least one proposal; the Stay action if nothing else.
/// - The only admissible randomness is the supplied [`DeterministicRng`].
pub trait Proposer<Obs> {
    /// Produce the tick's ranked proposal set.
    fn propose(
        &mut self,
        state: &CogState,
        obs: &Obs,
        params: &KernelParams,
        rng: &mut DeterministicRng,
    ) -> ProposerResult<ProposalSet>;
}
