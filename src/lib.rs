//! Swap puzzle: sort a grid of distinct integers into row-major order using
//! only swaps of side-by-side cells.

pub mod config;
pub mod error;
pub mod graph;
pub mod grid;
pub mod solver;

pub use config::{SolverConfig, Strategy};
pub use error::{GraphError, GridError, Result};
pub use graph::Graph;
pub use grid::{Cell, Direction, Grid, Swap, Value};
pub use solver::{solve, Solver};
