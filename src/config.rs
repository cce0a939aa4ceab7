//! Solver configuration.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which search the solver runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Exact search for small grids, greedy routing otherwise.
    #[default]
    Auto,
    /// Breadth-first search over grid configurations. Always shortest.
    Bfs,
    /// Iterative-deepening A* with a Manhattan bound. Always shortest.
    IdaStar,
    /// Place tokens one by one in row-major order. Not shortest.
    Greedy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub strategy: Strategy,

    /// Largest grid (in cells) that `Strategy::Auto` hands to the BFS tier.
    pub exact_max_cells: usize,

    /// Visited-state cap for the BFS tier.
    pub max_states: usize,

    /// Node expansion cap for the IDA* tier.
    pub max_expansions: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Auto,
            exact_max_cells: 9,
            max_states: 1_000_000,
            max_expansions: 20_000_000,
        }
    }
}

impl SolverConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_exact_max_cells(mut self, cells: usize) -> Self {
        self.exact_max_cells = cells;
        self
    }

    pub fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = max_states;
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }
}
