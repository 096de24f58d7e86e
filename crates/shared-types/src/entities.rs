//! Core domain entities: lattices, cognitive state, micro-actions.

use serde::{Deserialize, Serialize};

use crate::errors::{SharedTypesError, SharedTypesResult};
use crate::params::KernelParams;
use crate::Q18;

/// A dense 2-D integer lattice, row-major.
///
/// The shape is fixed at episode start (it belongs to the parameters, not
/// the state) and every lattice in a state or action must agree with it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    rows: usize,
    cols: usize,
    cells: Vec<i64>,
}

impl Lattice {
    /// All-zero lattice of the given shape.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, cells: vec![0; rows * cols] }
    }

    /// Build from nested rows; all rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> SharedTypesResult<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map(Vec::len).unwrap_or(0);
        for row in &rows {
            if row.len() != ncols {
                return Err(SharedTypesError::ShapeMismatch {
                    expected_rows: nrows,
                    expected_cols: ncols,
                    got_rows: nrows,
                    got_cols: row.len(),
                });
            }
        }
        Ok(Self { rows: nrows, cols: ncols, cells: rows.into_iter().flatten().collect() })
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> i64 {
        self.cells[i * self.cols + j]
    }

    /// Set cell at `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: i64) {
        self.cells[i * self.cols + j] = value;
    }

    /// Flat view of all cells, row-major.
    pub fn cells(&self) -> &[i64] {
        &self.cells
    }

    /// Check shape agreement with another lattice.
    pub fn same_shape(&self, other: &Lattice) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }

    /// Fail unless `other` has this lattice's shape.
    pub fn require_same_shape(&self, other: &Lattice) -> SharedTypesResult<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(SharedTypesError::ShapeMismatch {
                expected_rows: self.rows,
                expected_cols: self.cols,
                got_rows: other.rows,
                got_cols: other.cols,
            })
        }
    }

    /// Number of cells where the two lattices differ.
    pub fn cells_differing(&self, other: &Lattice) -> usize {
        self.cells
            .iter()
            .zip(other.cells.iter())
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Number of non-zero cells.
    pub fn nonzero_cells(&self) -> usize {
        self.cells.iter().filter(|c| **c != 0).count()
    }
}

/// The cognitive state `s = (rho, theta, C, b, t)`.
///
/// - `rho`: bounded density, `0 <= rho[i][j] <= rho_max`
/// - `theta`: unbounded phase
/// - `c`: non-negative cost potential
/// - `b`: remaining metabolic budget (Q18, non-negative)
/// - `t`: logical step counter (advances on every tick, rejected or not)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogState {
    /// Density lattice.
    pub rho: Lattice,
    /// Phase lattice.
    pub theta: Lattice,
    /// Cost-potential lattice.
    pub c: Lattice,
    /// Remaining metabolic budget (Q18).
    pub b: Q18,
    /// Logical step counter.
    pub t: u64,
}

impl CogState {
    /// Construct a state, validating shape agreement across lattices.
    pub fn new(rho: Lattice, theta: Lattice, c: Lattice, b: Q18) -> SharedTypesResult<Self> {
        rho.require_same_shape(&theta)?;
        rho.require_same_shape(&c)?;
        Ok(Self { rho, theta, c, b, t: 0 })
    }

    /// Membership in the feasible set K:
    /// `0 <= rho <= rho_max`, `C >= 0`, `b >= 0`.
    pub fn in_feasible_set(&self, params: &KernelParams) -> bool {
        self.rho
            .cells()
            .iter()
            .all(|&v| (0..=params.rho_max).contains(&v))
            && self.c.cells().iter().all(|&v| v >= 0)
            && self.b >= 0
    }
}

/// A micro-action `a = (drho, dtheta, u_glyph?)`: integer increments with
/// the state's lattice shape, plus an optional discrete tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroAction {
    /// Increment applied to `rho`.
    pub drho: Lattice,
    /// Increment applied to `theta`.
    pub dtheta: Lattice,
    /// Optional discrete glyph tag; charged a work surcharge when present.
    pub u_glyph: Option<String>,
}

impl MicroAction {
    /// The zero action for the given shape. The governor falls back to this
    /// when no proposal survives its filters.
    pub fn stay(rows: usize, cols: usize) -> Self {
        Self {
            drho: Lattice::zeros(rows, cols),
            dtheta: Lattice::zeros(rows, cols),
            u_glyph: None,
        }
    }

    /// True if this action changes nothing.
    pub fn is_stay(&self) -> bool {
        self.drho.nonzero_cells() == 0 && self.dtheta.nonzero_cells() == 0 && self.u_glyph.is_none()
    }

    /// Fail unless the action's lattices match the state's shape.
    pub fn require_shape_of(&self, state: &CogState) -> SharedTypesResult<()> {
        state.rho.require_same_shape(&self.drho)?;
        state.rho.require_same_shape(&self.dtheta)
    }
}

/// A read-only hazard bitmap with the state's lattice shape, produced by the
/// environment and consumed by the governor's safety filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardMask {
    rows: usize,
    cols: usize,
    blocked: Vec<bool>,
}

impl HazardMask {
    /// All-clear mask.
    pub fn clear(rows: usize, cols: usize) -> Self {
        Self { rows, cols, blocked: vec![false; rows * cols] }
    }

    /// Mark a cell hazardous.
    pub fn block(&mut self, i: usize, j: usize) {
        self.blocked[i * self.cols + j] = true;
    }

    /// Is the cell hazardous?
    pub fn is_blocked(&self, i: usize, j: usize) -> bool {
        self.blocked[i * self.cols + j]
    }

    /// Row count.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True if any cell the action deposits density into is hazardous.
    pub fn action_hits_hazard(&self, action: &MicroAction) -> bool {
        for i in 0..self.rows.min(action.drho.rows()) {
            for j in 0..self.cols.min(action.drho.cols()) {
                if action.drho.get(i, j) > 0 && self.is_blocked(i, j) {
                    return true;
                }
            }
        }
        false
    }
}
