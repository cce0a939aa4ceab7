use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rand::{seq::SliceRandom, thread_rng, Rng};
use tracing::info;

use crate::error::{GridError, Result};

/// A cell value. Values must be distinct for a grid to be solvable.
pub type Value = i64;

/// A `(row, column)` coordinate, 0-indexed.
pub type Cell = (usize, usize);

/// One exchange between two side-by-side cells.
pub type Swap = (Cell, Cell);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    pub fn as_offset(&self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Left => (0, -1),
            Direction::Down => (1, 0),
            Direction::Right => (0, 1),
        }
    }
}

/// The cell one step from `cell` towards `dir`, if it lies inside an
/// `m` by `n` grid.
pub fn step((i, j): Cell, dir: Direction, m: usize, n: usize) -> Option<Cell> {
    let (di, dj) = dir.as_offset();
    let new_i = i.checked_add_signed(di)?;
    let new_j = j.checked_add_signed(dj)?;
    (new_i < m && new_j < n).then_some((new_i, new_j))
}

/// Manhattan distance between two cells.
pub fn manhattan(a: Cell, b: Cell) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

/// An `m` by `n` grid of integers, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    m: usize,
    n: usize,
    state: Vec<Value>,
}

impl Grid {
    /// Builds a grid from explicit rows.
    ///
    /// Rows must be non-empty and all of the same length. Values are not
    /// required to be distinct here; the solver checks that.
    pub fn new(rows: Vec<Vec<Value>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        if let Some(row) = rows.iter().position(|row| row.is_empty()) {
            return Err(GridError::EmptyRow(row));
        }

        let m = rows.len();
        let n = rows[0].len();

        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != n)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(GridError::NotRectangular {
                row,
                expected: n,
                found,
            });
        }

        let state = rows.into_iter().flatten().collect();
        Ok(Self { m, n, state })
    }

    fn check_dimensions(m: usize, n: usize) -> Result<()> {
        if m == 0 || n == 0 {
            Err(GridError::InvalidDimension { m, n })
        } else {
            Ok(())
        }
    }

    /// Cell `(i, j)` holds `i * n + j + 1`.
    pub fn create_sorted(m: usize, n: usize) -> Result<Self> {
        Self::check_dimensions(m, n)?;
        let cells = m
            .checked_mul(n)
            .and_then(|cells| Value::try_from(cells).ok())
            .ok_or(GridError::InvalidDimension { m, n })?;

        let state = (1..=cells).collect();
        Ok(Self { m, n, state })
    }

    pub fn create_random(m: usize, n: usize) -> Result<Self> {
        Self::create_random_with(m, n, &mut thread_rng())
    }

    /// Shuffles `1..=m*n` with the given generator.
    pub fn create_random_with<R: Rng + ?Sized>(m: usize, n: usize, rng: &mut R) -> Result<Self> {
        let mut grid = Self::create_sorted(m, n)?;
        grid.state.shuffle(rng);
        Ok(grid)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let grid = Self::parse(BufReader::new(File::open(path)?))?;
        info!(path = %path.display(), m = grid.m, n = grid.n, "loaded grid");
        Ok(grid)
    }

    /// Reads the text format: a header line `m n`, then `m` lines of `n`
    /// whitespace-separated integers.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.ok_or_else(|| GridError::Format {
            line: 1,
            reason: "missing header".to_string(),
        })?;
        let (m, n) = parse_header(&header)?;

        // The header is only trusted once the rows are actually there.
        let mut rows = Vec::new();
        for i in 0..m {
            let line = i + 2;
            let text = lines.next().transpose()?.ok_or_else(|| GridError::Format {
                line,
                reason: format!("expected {} rows, found {}", m, i),
            })?;

            let row = text
                .split_whitespace()
                .map(|token| {
                    token.parse::<Value>().map_err(|_| GridError::Format {
                        line,
                        reason: format!("'{}' is not an integer", token),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            if row.len() != n {
                return Err(GridError::Format {
                    line,
                    reason: format!("expected {} values, found {}", n, row.len()),
                });
            }
            rows.push(row);
        }

        Self::new(rows)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{} {}", self.m, self.n)?;
        for row in self.state.chunks(self.n) {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.m
    }

    pub fn cols(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// The state as nested rows.
    pub fn state(&self) -> Vec<Vec<Value>> {
        self.state.chunks(self.n).map(<[Value]>::to_vec).collect()
    }

    /// The state flattened in row-major order.
    pub fn as_slice(&self) -> &[Value] {
        &self.state
    }

    pub fn contains(&self, (i, j): Cell) -> bool {
        i < self.m && j < self.n
    }

    pub fn get(&self, cell: Cell) -> Option<Value> {
        self.contains(cell).then(|| self.state[self.index(cell)])
    }

    pub(crate) fn index(&self, (i, j): Cell) -> usize {
        i * self.n + j
    }

    /// Every coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.m).flat_map(move |i| (0..self.n).map(move |j| (i, j)))
    }

    /// True iff the row-major reading is strictly ascending.
    pub fn is_sorted(&self) -> bool {
        self.state.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Exchanges two side-by-side cells. The grid is left untouched on error.
    pub fn swap(&mut self, cell1: Cell, cell2: Cell) -> Result<()> {
        for cell in [cell1, cell2] {
            if !self.contains(cell) {
                return Err(GridError::OutOfBounds(cell));
            }
        }
        if manhattan(cell1, cell2) != 1 {
            return Err(GridError::IllegalSwap {
                from: cell1,
                to: cell2,
            });
        }

        let (a, b) = (self.index(cell1), self.index(cell2));
        self.state.swap(a, b);
        Ok(())
    }

    /// Applies `swaps` in order.
    ///
    /// Stops at the first illegal swap and returns its error. Swaps applied
    /// before that point are kept; nothing is rolled back.
    pub fn swap_seq(&mut self, swaps: &[Swap]) -> Result<()> {
        for &(cell1, cell2) in swaps {
            self.swap(cell1, cell2)?;
        }
        Ok(())
    }
}

fn parse_header(header: &str) -> Result<(usize, usize)> {
    let malformed = || GridError::Format {
        line: 1,
        reason: format!("malformed header '{}', expected 'm n'", header.trim()),
    };

    let dims = header
        .split_whitespace()
        .map(|token| token.parse::<usize>().map_err(|_| malformed()))
        .collect::<Result<Vec<_>>>()?;

    match dims[..] {
        [m, n] if m > 0 && n > 0 => Ok((m, n)),
        _ => Err(malformed()),
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .state
            .iter()
            .map(|v| v.to_string().len())
            .max()
            .unwrap_or(1);

        writeln!(f, "Grid {}x{}:", self.m, self.n)?;
        for row in self.state.chunks(self.n) {
            for &val in row {
                write!(f, "{:>width$} ", val, width = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
