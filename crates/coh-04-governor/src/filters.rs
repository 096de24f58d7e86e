//! The filter stages, one pure function per stage.
//!
//! Each stage consumes the surviving candidates and returns the survivors
//! plus elimination records. Stages never reorder candidates; order only
//! stops mattering at final score selection.

use shared_types::{HazardMask, Proposal, RejectCode, Q18};

use crate::config::GovernorConfig;

/// A proposal with its pre-computed step evaluation.
pub struct Candidate<'a> {
    /// Position within the proposal set.
    pub index: u32,
    /// The proposal itself.
    pub proposal: &'a Proposal,
    /// Action lattices match the state's shape.
    pub shape_ok: bool,
    /// Projected candidate state lies in K.
    pub feasible: bool,
    /// `V(candidate) - V(state)`; zero when infeasible or malformed.
    pub dv_q: Q18,
}

/// An eliminated proposal and why.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Elimination {
    /// Position within the proposal set.
    pub index: u32,
    /// Stage code that removed it.
    pub code: RejectCode,
}

type StageResult<'a> = (Vec<Candidate<'a>>, Vec<Elimination>);

fn partition<'a>(
    candidates: Vec<Candidate<'a>>,
    mut eliminate: impl FnMut(&Candidate<'a>) -> Option<RejectCode>,
) -> StageResult<'a> {
    let mut survivors = Vec::with_capacity(candidates.len());
    let mut eliminated = Vec::new();
    for candidate in candidates {
        match eliminate(&candidate) {
            Some(code) => eliminated.push(Elimination { index: candidate.index, code }),
            None => survivors.push(candidate),
        }
    }
    (survivors, eliminated)
}

/// Stage 1: environment safety. Removes actions that deposit density onto
/// a hazard cell or do not fit the state's lattice domain.
pub fn safety_filter<'a>(candidates: Vec<Candidate<'a>>, mask: &HazardMask) -> StageResult<'a> {
    partition(candidates, |c| {
        if !c.shape_ok {
            Some(RejectCode::OutOfBounds)
        } else if mask.action_hits_hazard(&c.proposal.action) {
            Some(RejectCode::Hazard)
        } else {
            None
        }
    })
}

/// Stage 2: taint. The only taint policy the kernel applies.
pub fn taint_filter<'a>(candidates: Vec<Candidate<'a>>, config: &GovernorConfig) -> StageResult<'a> {
    partition(candidates, |c| {
        if config.reject_untrusted_taint && c.proposal.taint.as_deref() == Some("untrusted") {
            Some(RejectCode::TaintUntrusted)
        } else {
            None
        }
    })
}

/// Stage 3: admissibility. The projected candidate must land in K.
pub fn admissibility_filter(candidates: Vec<Candidate<'_>>) -> StageResult<'_> {
    partition(candidates, |c| {
        if c.feasible {
            None
        } else {
            Some(RejectCode::Infeasible)
        }
    })
}

/// Stage 4: Lyapunov descent. Applied while the absorption policy is
/// enabled; the engine's own gate remains the enforcer either way.
pub fn lyapunov_filter(candidates: Vec<Candidate<'_>>, absorb_enabled: bool) -> StageResult<'_> {
    if !absorb_enabled {
        return (candidates, Vec::new());
    }
    partition(candidates, |c| {
        if c.dv_q > 0 {
            Some(RejectCode::LyapunovIncrease)
        } else {
            None
        }
    })
}

/// Stage 5: absorption. At `b = 0` only non-worsening actions remain.
pub fn absorption_filter(candidates: Vec<Candidate<'_>>, b_prev: Q18) -> StageResult<'_> {
    if b_prev != 0 {
        return (candidates, Vec::new());
    }
    partition(candidates, |c| {
        if c.dv_q > 0 {
            Some(RejectCode::AbsorbB0DvPos)
        } else {
            None
        }
    })
}

/// Stage 6: among survivors pick maximum `score_q`; ties break toward the
/// lexicographically smallest proposal digest, then the smallest index.
pub fn select_by_score<'a>(candidates: &'a [Candidate<'a>]) -> Option<&'a Candidate<'a>> {
    candidates.iter().max_by(|a, b| {
        a.proposal
            .score_q
            .cmp(&b.proposal.score_q)
            .then_with(|| b.proposal.id.cmp(&a.proposal.id))
            .then_with(|| b.index.cmp(&a.index))
    })
}
