//! Environment adapters. The lattice grid is the reference task, not a
//! contract; hosts wire their own environments through [`crate::ports`].

pub mod lattice_grid;
