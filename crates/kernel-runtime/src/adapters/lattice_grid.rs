//! Reference deterministic gridworld.
//!
//! Walls are impassable, hazards are governed away, the goal drifts under a
//! seed-derived stream. The agent is the single unit of density in the
//! cognitive state's `rho` lattice: a move withdraws density from the
//! current cell and deposits it on the target, so the governor's hazard
//! filter sees exactly the cells an action touches.
//!
//! Grid episodes run with the budget-barrier weight zeroed: motion neither
//! sheds nor creates phase energy, so the Lyapunov gate reduces to
//! safety and admissibility for this task.

use coh_01_fixed_point::{from_int, ONE_Q18};
use coh_02_canonical::canonical_sha256;
use coh_05_proposer::{
    alpha_q, exploration_bonus_q, proposal_id, score_q, ExplorationConfig, Proposer,
    ProposerResult, VisitTable,
};
use serde::Serialize;
use shared_crypto::{prng, DeterministicRng, GENESIS};
use shared_types::{CogState, Digest, HazardMask, KernelParams, Lattice, MicroAction, Proposal, ProposalSet, Q18};

use crate::ports::{EnvTransition, Environment};

/// Empty cell.
pub const CELL_EMPTY: u8 = 0;
/// Impassable cell.
pub const CELL_WALL: u8 = 1;
/// Unsafe cell; entering one is a governance failure.
pub const CELL_HAZARD: u8 = 2;

/// Reward per ordinary step: -1.
const STEP_REWARD_Q: Q18 = -ONE_Q18;
/// Reward for reaching the goal: +100.
const GOAL_REWARD_Q: Q18 = 100 * ONE_Q18;
/// Penalty for landing on a hazard (the governor should prevent this).
const HAZARD_REWARD_Q: Q18 = -50 * ONE_Q18;

/// The immutable gridworld map.
#[derive(Clone, Debug)]
pub struct LatticeGrid {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    start: (usize, usize),
    initial_goal: (usize, usize),
}

/// Mutable environment state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridState {
    /// Agent position `(row, col)`.
    pub agent: (usize, usize),
    /// Current goal position.
    pub goal: (usize, usize),
    /// Drift seed, fixed at reset.
    pub seed: u64,
}

/// Observation: local patch plus goal beacon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridObs {
    /// 5x5 cell patch centered on the agent; out-of-bounds reads as wall.
    pub local_patch: Vec<Vec<u8>>,
    /// `(goal_row - agent_row, goal_col - agent_col)`.
    pub goal_delta: (i64, i64),
    /// Manhattan distance to the goal.
    pub distance: i64,
}

impl LatticeGrid {
    /// Build a map. Out-of-range walls and hazards are ignored.
    pub fn new(
        rows: usize,
        cols: usize,
        walls: &[(usize, usize)],
        hazards: &[(usize, usize)],
        start: (usize, usize),
        goal: (usize, usize),
    ) -> Self {
        let mut cells = vec![CELL_EMPTY; rows * cols];
        for &(r, c) in walls {
            if r < rows && c < cols {
                cells[r * cols + c] = CELL_WALL;
            }
        }
        for &(r, c) in hazards {
            if r < rows && c < cols {
                cells[r * cols + c] = CELL_HAZARD;
            }
        }
        Self { rows, cols, cells, start, initial_goal: goal }
    }

    /// The 7x7 reference map: one wall segment, one hazard pocket.
    pub fn simple() -> Self {
        Self::new(
            7,
            7,
            &[(2, 2), (2, 3), (2, 4), (3, 2)],
            &[(4, 4), (5, 1)],
            (0, 0),
            (6, 6),
        )
    }

    /// A 3x12 corridor with a hazard midway: the beacon drifts faster than
    /// the agent can close, which is what stresses drift handling.
    pub fn corridor() -> Self {
        Self::new(3, 12, &[], &[(1, 6)], (1, 0), (1, 11))
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell code at `(r, c)`.
    pub fn cell(&self, r: usize, c: usize) -> u8 {
        self.cells[r * self.cols + c]
    }

    /// The initial cognitive state for this map: one unit of density at the
    /// start cell, everything else flat, with the given budget.
    pub fn initial_cog_state(&self, budget_q: Q18) -> CogState {
        let mut rho = Lattice::zeros(self.rows, self.cols);
        rho.set(self.start.0, self.start.1, 1);
        CogState {
            rho,
            theta: Lattice::zeros(self.rows, self.cols),
            c: Lattice::zeros(self.rows, self.cols),
            b: budget_q,
            t: 0,
        }
    }

    /// Parameters tuned for grid episodes: the budget barrier is zeroed so
    /// motion is Lyapunov-neutral and governance reduces to safety.
    pub fn params(&self) -> KernelParams {
        KernelParams { w_budget_barrier_q: 0, ..KernelParams::default() }
    }

    fn passable(&self, r: i64, c: i64) -> bool {
        r >= 0
            && c >= 0
            && (r as usize) < self.rows
            && (c as usize) < self.cols
            && self.cell(r as usize, c as usize) != CELL_WALL
    }

    /// Decode a density-move action: the cell gaining density is the move
    /// target. No positive deposit means Stay.
    fn decode_target(&self, state: &GridState, action: &MicroAction) -> (usize, usize) {
        for r in 0..self.rows.min(action.drho.rows()) {
            for c in 0..self.cols.min(action.drho.cols()) {
                if action.drho.get(r, c) > 0 {
                    let (ar, ac) = state.agent;
                    let adjacent =
                        r.abs_diff(ar) + c.abs_diff(ac) == 1;
                    if adjacent && self.passable(r as i64, c as i64) {
                        return (r, c);
                    }
                    return state.agent;
                }
            }
        }
        state.agent
    }

    fn manhattan(a: (usize, usize), b: (usize, usize)) -> i64 {
        a.0.abs_diff(b.0) as i64 + a.1.abs_diff(b.1) as i64
    }
}

impl Environment for LatticeGrid {
    type State = GridState;
    type Obs = GridObs;

    fn reset(&self, seed: u64) -> (GridState, GridObs) {
        let state = GridState { agent: self.start, goal: self.initial_goal, seed };
        let obs = self.observe(&state);
        (state, obs)
    }

    fn step(&self, state: &GridState, action: &MicroAction) -> EnvTransition<GridState, GridObs> {
        let target = self.decode_target(state, action);
        let landed = self.cell(target.0, target.1);
        let next = GridState { agent: target, ..state.clone() };

        let (reward_q, hazard_hit, terminal) = if target == next.goal {
            (GOAL_REWARD_Q, false, true)
        } else if landed == CELL_HAZARD {
            (HAZARD_REWARD_Q, true, false)
        } else {
            (STEP_REWARD_Q, false, false)
        };

        let obs = self.observe(&next);
        EnvTransition { state: next, obs, reward_q, hazard_hit, terminal }
    }

    fn drift(&self, state: &GridState, step_index: u64) -> GridState {
        // Idempotent per index: the stream depends only on (seed, index).
        let seed_bytes = prng::derive_seed(&GENESIS, state.seed, step_index);
        let mut rng = DeterministicRng::for_step(&seed_bytes, state.seed, step_index);
        let (gr, gc) = state.goal;
        let candidates: Vec<(usize, usize)> = [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)]
            .iter()
            .filter_map(|&(dr, dc)| {
                let (nr, nc) = (gr as i64 + dr, gc as i64 + dc);
                (self.passable(nr, nc) && self.cell(nr as usize, nc as usize) == CELL_EMPTY)
                    .then_some((nr as usize, nc as usize))
            })
            .collect();
        if candidates.is_empty() {
            return state.clone();
        }
        let goal = candidates[rng.pick_index(candidates.len())];
        GridState { goal, ..state.clone() }
    }

    fn hazard_mask(&self, _state: &GridState) -> HazardMask {
        let mut mask = HazardMask::clear(self.rows, self.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.cell(r, c) == CELL_HAZARD {
                    mask.block(r, c);
                }
            }
        }
        mask
    }

    fn observe(&self, state: &GridState) -> GridObs {
        let (ar, ac) = state.agent;
        let mut local_patch = vec![vec![CELL_WALL; 5]; 5];
        for (pi, row) in local_patch.iter_mut().enumerate() {
            for (pj, cell) in row.iter_mut().enumerate() {
                let r = ar as i64 + pi as i64 - 2;
                let c = ac as i64 + pj as i64 - 2;
                if r >= 0 && c >= 0 && (r as usize) < self.rows && (c as usize) < self.cols {
                    *cell = self.cell(r as usize, c as usize);
                }
            }
        }
        GridObs {
            local_patch,
            goal_delta: (
                state.goal.0 as i64 - ar as i64,
                state.goal.1 as i64 - ac as i64,
            ),
            distance: Self::manhattan(state.agent, state.goal),
        }
    }
}

/// Greedy grid proposer: one proposal per admissible unit move plus Stay,
/// scored `-distance + alpha(b) / sqrt(N + 1)`.
pub struct GridProposer {
    grid: LatticeGrid,
    config: ExplorationConfig,
    visits: VisitTable,
}

#[derive(Serialize)]
struct CellKey {
    r: usize,
    c: usize,
}

impl GridProposer {
    /// Build a proposer for the given map.
    pub fn new(grid: LatticeGrid, config: ExplorationConfig) -> Self {
        Self { grid, config, visits: VisitTable::new() }
    }

    fn agent_cell(cog: &CogState) -> (usize, usize) {
        let mut best = (0, 0);
        let mut best_density = i64::MIN;
        for r in 0..cog.rho.rows() {
            for c in 0..cog.rho.cols() {
                if cog.rho.get(r, c) > best_density {
                    best_density = cog.rho.get(r, c);
                    best = (r, c);
                }
            }
        }
        best
    }

    fn move_action(&self, from: (usize, usize), to: (usize, usize)) -> MicroAction {
        let mut action = MicroAction::stay(self.grid.rows(), self.grid.cols());
        if from != to {
            action.drho.set(from.0, from.1, -1);
            action.drho.set(to.0, to.1, 1);
        }
        action
    }
}

impl Proposer<GridObs> for GridProposer {
    fn propose(
        &mut self,
        state: &CogState,
        obs: &GridObs,
        _params: &KernelParams,
        _rng: &mut DeterministicRng,
    ) -> ProposerResult<ProposalSet> {
        let agent = Self::agent_cell(state);
        self.visits.record(Digest(canonical_sha256(&CellKey { r: agent.0, c: agent.1 })?));

        let goal = (
            agent.0 as i64 + obs.goal_delta.0,
            agent.1 as i64 + obs.goal_delta.1,
        );

        let mut targets: Vec<(usize, usize)> = Vec::with_capacity(5);
        for (dr, dc) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
            let (nr, nc) = (agent.0 as i64 + dr, agent.1 as i64 + dc);
            if self.grid.passable(nr, nc) {
                targets.push((nr as usize, nc as usize));
            }
        }
        targets.push(agent); // Stay is always proposed.

        let alpha = alpha_q(state.b, &self.config)?;
        let mut proposals = Vec::with_capacity(targets.len());
        for (index, target) in targets.into_iter().enumerate() {
            let action = self.move_action(agent, target);
            let distance = (goal.0 - target.0 as i64).abs() + (goal.1 - target.1 as i64).abs();
            let v_task_q = from_int(distance)?;
            let visits = self
                .visits
                .visits(&Digest(canonical_sha256(&CellKey { r: target.0, c: target.1 })?));
            let score = score_q(v_task_q, alpha, exploration_bonus_q(visits)?)?;
            proposals.push(Proposal {
                id: proposal_id(&action, score, index as u32)?,
                action,
                score_q: score,
                taint: None,
                metadata: serde_json::Map::new(),
            });
        }
        Ok(ProposalSet::new(proposals)?)
    }
}
