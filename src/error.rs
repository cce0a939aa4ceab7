use std::io;

use thiserror::Error;

use crate::grid::{Cell, Value};

pub type Result<T, E = GridError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid dimensions {m}x{n}: both must be positive")]
    InvalidDimension { m: usize, n: usize },

    #[error("the grid cannot be empty")]
    EmptyGrid,

    #[error("row {0} is empty")]
    EmptyRow(usize),

    #[error("row {row} has {found} values, but previous ones have {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("value {0} appears more than once")]
    DuplicateValue(Value),

    #[error("cell {0:?} lies outside the grid")]
    OutOfBounds(Cell),

    #[error("cells {from:?} and {to:?} are not side by side")]
    IllegalSwap { from: Cell, to: Cell },

    #[error("line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("search gave up after {limit} states")]
    SearchLimit { limit: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("edge {0} -- {1} already exists")]
    EdgeAlreadyExists(String, String),

    #[error("self-loop on node {0}")]
    SelfLoop(String),

    #[error("line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}
