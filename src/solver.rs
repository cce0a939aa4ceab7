//! Computes swap sequences that sort a grid.
//!
//! Every configuration is reachable because adjacent transpositions generate
//! all permutations of a connected grid, so there is no solvability check.
//! The solver ranks the grid's values and searches on that working copy; the
//! caller's grid is never modified.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::config::{SolverConfig, Strategy};
use crate::error::{GridError, Result};
use crate::graph::Graph;
use crate::grid::{manhattan, step, Cell, Direction, Grid, Swap};

/// Sorts `grid` with the default configuration.
pub fn solve(grid: &Grid) -> Result<Vec<Swap>> {
    Solver::default().solve(grid)
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Bfs,
    IdaStar,
    Greedy,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Returns swaps that, applied in order with `Grid::swap_seq`, sort
    /// `grid`.
    ///
    /// Fails with `DuplicateValue` if two cells hold the same value, and with
    /// `SearchLimit` if an exact tier exceeds its configured budget.
    pub fn solve(&self, grid: &Grid) -> Result<Vec<Swap>> {
        let board = Board::ranked(grid)?;
        if board.is_solved() {
            debug!(m = board.m, n = board.n, "grid already sorted");
            return Ok(Vec::new());
        }

        let tier = self.tier_for(board.len());
        debug!(?tier, m = board.m, n = board.n, "solving grid");

        let solution = match tier {
            Tier::Bfs => breadth_first(&board, self.config.max_states)?,
            Tier::IdaStar => IdaStar::new(board, self.config.max_expansions).run()?,
            Tier::Greedy => greedy(board),
        };

        debug!(swaps = solution.len(), "found solution");
        Ok(solution)
    }

    pub fn get_solution(&self, grid: &Grid) -> Result<Vec<Swap>> {
        self.solve(grid)
    }

    fn tier_for(&self, cells: usize) -> Tier {
        match self.config.strategy {
            Strategy::Auto if cells <= self.config.exact_max_cells => Tier::Bfs,
            Strategy::Auto | Strategy::Greedy => Tier::Greedy,
            Strategy::Bfs => Tier::Bfs,
            Strategy::IdaStar => Tier::IdaStar,
        }
    }
}

/// A grid whose values are replaced by their rank, so the sorted target is
/// always `0, 1, 2, ...` in row-major order.
#[derive(Debug, Clone)]
struct Board {
    m: usize,
    n: usize,
    tiles: Vec<u32>,
}

impl Board {
    fn ranked(grid: &Grid) -> Result<Self> {
        let mut sorted = grid.as_slice().to_vec();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(GridError::DuplicateValue(pair[0]));
        }

        let tiles = grid
            .as_slice()
            .iter()
            .map(|value| sorted.partition_point(|v| v < value) as u32)
            .collect();

        Ok(Self {
            m: grid.rows(),
            n: grid.cols(),
            tiles,
        })
    }

    fn len(&self) -> usize {
        self.tiles.len()
    }

    fn cell(&self, idx: usize) -> Cell {
        (idx / self.n, idx % self.n)
    }

    fn is_solved(&self) -> bool {
        is_identity(&self.tiles)
    }

    /// Half the summed Manhattan distances, rounded up. One swap moves two
    /// tokens by one step each, so this never overestimates.
    fn heuristic(&self) -> usize {
        let total: usize = self
            .tiles
            .iter()
            .enumerate()
            .map(|(idx, &tile)| manhattan(self.cell(idx), self.cell(tile as usize)))
            .sum();
        total.div_ceil(2)
    }

    fn index(&self, (i, j): Cell) -> usize {
        i * self.n + j
    }

    /// Right and lower neighbours of the cell at `idx`.
    fn forward_neighbors(&self, idx: usize) -> impl Iterator<Item = Cell> {
        let (cell, m, n) = (self.cell(idx), self.m, self.n);
        FORWARD
            .into_iter()
            .filter_map(move |dir| step(cell, dir, m, n))
    }

    fn to_swap(&self, (a, b): (usize, usize)) -> Swap {
        (self.cell(a), self.cell(b))
    }

    /// Every horizontal and vertical neighbour pair as flat indices,
    /// row-major, right before down.
    fn adjacent_pairs(&self) -> Vec<(usize, usize)> {
        (0..self.len())
            .flat_map(|idx| {
                self.forward_neighbors(idx)
                    .map(move |other| (idx, self.index(other)))
            })
            .collect()
    }
}

const FORWARD: [Direction; 2] = [Direction::Right, Direction::Down];

fn is_identity(tiles: &[u32]) -> bool {
    tiles.iter().enumerate().all(|(idx, &tile)| idx == tile as usize)
}

/// Shortest solution by breadth-first search over configurations.
///
/// Each visited state remembers the pair that first reached it. Swaps undo
/// themselves, so the path is unwound from the goal by applying those pairs
/// again.
fn breadth_first(board: &Board, max_states: usize) -> Result<Vec<Swap>> {
    let pairs = board.adjacent_pairs();
    let start: Box<[u32]> = board.tiles.clone().into_boxed_slice();

    let mut came_from: HashMap<Box<[u32]>, Option<usize>> = HashMap::new();
    came_from.insert(start.clone(), None);
    let mut queue = VecDeque::from([(start, 0usize)]);
    let mut depth = 0;

    while let Some((state, dist)) = queue.pop_front() {
        if dist > depth {
            depth = dist;
            trace!(depth, visited = came_from.len(), "bfs frontier");
        }
        if is_identity(&state) {
            return Ok(unwind(board, &pairs, &came_from, state));
        }

        for (k, &(a, b)) in pairs.iter().enumerate() {
            let mut next = state.clone();
            next.swap(a, b);
            if came_from.contains_key(&next) {
                continue;
            }
            if came_from.len() >= max_states {
                return Err(GridError::SearchLimit { limit: max_states });
            }
            came_from.insert(next.clone(), Some(k));
            queue.push_back((next, dist + 1));
        }
    }

    // The permutation graph is connected, so the goal is always dequeued.
    Err(GridError::SearchLimit {
        limit: came_from.len(),
    })
}

fn unwind(
    board: &Board,
    pairs: &[(usize, usize)],
    came_from: &HashMap<Box<[u32]>, Option<usize>>,
    goal: Box<[u32]>,
) -> Vec<Swap> {
    let mut path = Vec::new();
    let mut state = goal.into_vec();

    while let Some(&Some(k)) = came_from.get(state.as_slice()) {
        let (a, b) = pairs[k];
        path.push(board.to_swap((a, b)));
        state.swap(a, b);
    }

    path.reverse();
    path
}

enum Search {
    Found,
    NextBound(usize),
}

/// Iterative-deepening A*. Uses far less memory than BFS and finds a
/// solution of the same length.
struct IdaStar {
    board: Board,
    pairs: Vec<(usize, usize)>,
    path: Vec<usize>,
    expanded: usize,
    max_expansions: usize,
}

impl IdaStar {
    fn new(board: Board, max_expansions: usize) -> Self {
        let pairs = board.adjacent_pairs();
        Self {
            board,
            pairs,
            path: Vec::new(),
            expanded: 0,
            max_expansions,
        }
    }

    fn run(mut self) -> Result<Vec<Swap>> {
        let mut bound = self.board.heuristic();

        loop {
            trace!(bound, expanded = self.expanded, "ida* iteration");
            match self.search(0, bound, None)? {
                Search::Found => {
                    return Ok(self
                        .path
                        .iter()
                        .map(|&k| self.board.to_swap(self.pairs[k]))
                        .collect());
                }
                Search::NextBound(next) if next > bound && next != usize::MAX => bound = next,
                Search::NextBound(_) => {
                    return Err(GridError::SearchLimit {
                        limit: self.expanded,
                    })
                }
            }
        }
    }

    fn search(&mut self, g: usize, bound: usize, last: Option<usize>) -> Result<Search> {
        let f = g + self.board.heuristic();
        if f > bound {
            return Ok(Search::NextBound(f));
        }
        if self.board.is_solved() {
            return Ok(Search::Found);
        }

        self.expanded += 1;
        if self.expanded > self.max_expansions {
            return Err(GridError::SearchLimit {
                limit: self.max_expansions,
            });
        }

        let mut min = usize::MAX;
        for k in 0..self.pairs.len() {
            // Repeating a swap just undoes it.
            if last == Some(k) {
                continue;
            }

            let (a, b) = self.pairs[k];
            self.board.tiles.swap(a, b);
            self.path.push(k);

            match self.search(g + 1, bound, Some(k))? {
                Search::Found => return Ok(Search::Found),
                Search::NextBound(t) => min = min.min(t),
            }

            self.path.pop();
            self.board.tiles.swap(a, b);
        }

        Ok(Search::NextBound(min))
    }
}

/// Places tokens in row-major order, routing each one along a shortest path
/// through the cells that are not yet fixed.
///
/// The unfixed cells are the remainder of the current row plus every row
/// below it, which is always connected, and a route through them never
/// disturbs an earlier token. Each route is at most `m + n` steps long.
fn greedy(mut board: Board) -> Vec<Swap> {
    let mut swaps = Vec::new();

    for target in 0..board.len() {
        let Some(current) = board.tiles.iter().position(|&t| t as usize == target) else {
            continue;
        };
        if current == target {
            continue;
        }

        let free = free_region(&board, target);
        let (from, to) = (board.cell(current), board.cell(target));
        let route = free
            .bfs(&from, &to)
            .expect("unfixed cells form a connected region");
        trace!(token = target, ?from, ?to, steps = route.len() - 1, "routing token");

        for pair in route.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (a_idx, b_idx) = (board.index(a), board.index(b));
            board.tiles.swap(a_idx, b_idx);
            swaps.push((a, b));
        }
    }

    swaps
}

/// Grid graph over the cells at or after `first` in row-major order.
fn free_region(board: &Board, first: usize) -> Graph<Cell> {
    let mut graph = Graph::new((first..board.len()).map(|idx| board.cell(idx)));

    for idx in first..board.len() {
        for other in board.forward_neighbors(idx) {
            graph
                .add_edge(board.cell(idx), other)
                .expect("each cell links forward once");
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn solver(strategy: Strategy) -> Solver {
        Solver::new(SolverConfig::default().with_strategy(strategy))
    }

    fn assert_sorts(grid: &Grid, solution: &[Swap]) {
        let mut replay = grid.clone();
        for &(a, b) in solution {
            assert_eq!(manhattan(a, b), 1, "swap {:?} is not adjacent", (a, b));
        }
        replay.swap_seq(solution).unwrap();
        assert!(replay.is_sorted(), "not sorted:\n{}", replay);
    }

    /// Distance from the sorted state to every configuration of an m x n
    /// grid holding `1..=m*n`.
    fn distances(m: usize, n: usize) -> HashMap<Vec<i64>, usize> {
        let sorted = Grid::create_sorted(m, n).unwrap();
        let start = sorted.as_slice().to_vec();
        let pairs = Board::ranked(&sorted).unwrap().adjacent_pairs();

        let mut dist = HashMap::from([(start.clone(), 0)]);
        let mut queue = VecDeque::from([start]);
        while let Some(state) = queue.pop_front() {
            let d = dist[&state];
            for &(a, b) in &pairs {
                let mut next = state.clone();
                next.swap(a, b);
                dist.entry(next.clone()).or_insert_with(|| {
                    queue.push_back(next);
                    d + 1
                });
            }
        }
        dist
    }

    fn grid_from_flat(n: usize, flat: &[i64]) -> Grid {
        Grid::new(flat.chunks(n).map(<[i64]>::to_vec).collect()).unwrap()
    }

    #[test]
    fn reversed_2x2_is_sorted() {
        let grid = Grid::new(vec![vec![4, 3], vec![2, 1]]).unwrap();

        for strategy in [Strategy::Auto, Strategy::Bfs, Strategy::IdaStar, Strategy::Greedy] {
            let solution = solver(strategy).solve(&grid).unwrap();
            assert_sorts(&grid, &solution);

            let mut replay = grid.clone();
            replay.swap_seq(&solution).unwrap();
            assert_eq!(replay.state(), vec![vec![1, 2], vec![3, 4]]);
        }
    }

    #[test]
    fn sorted_grid_needs_no_swaps() {
        for (m, n) in [(1, 1), (1, 5), (3, 3), (4, 6)] {
            let grid = Grid::create_sorted(m, n).unwrap();
            for strategy in [Strategy::Auto, Strategy::Bfs, Strategy::IdaStar, Strategy::Greedy] {
                assert!(solver(strategy).solve(&grid).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn duplicates_are_rejected() {
        let grid = Grid::new(vec![vec![1, 2], vec![2, 3]]).unwrap();
        assert!(matches!(solve(&grid), Err(GridError::DuplicateValue(2))));
    }

    #[test]
    fn get_solution_matches_solve() {
        let grid = Grid::new(vec![vec![6, 2, 4], vec![1, 5, 3]]).unwrap();
        for strategy in [Strategy::Bfs, Strategy::Greedy] {
            let tier = solver(strategy);
            assert_eq!(tier.get_solution(&grid).unwrap(), tier.solve(&grid).unwrap());
        }
    }

    #[test]
    fn adjacent_pairs_go_right_then_down() {
        let board = Board::ranked(&Grid::create_sorted(2, 2).unwrap()).unwrap();
        assert_eq!(board.adjacent_pairs(), vec![(0, 1), (0, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn caller_grid_is_untouched() {
        let grid = Grid::new(vec![vec![3, 1], vec![2, 4]]).unwrap();
        let before = grid.clone();
        solve(&grid).unwrap();
        assert_eq!(grid, before);
    }

    #[test]
    fn non_contiguous_values_are_ranked() {
        let grid = Grid::new(vec![vec![100, -3, 7], vec![42, 0, -50]]).unwrap();
        for strategy in [Strategy::Bfs, Strategy::Greedy] {
            let solution = solver(strategy).solve(&grid).unwrap();
            assert_sorts(&grid, &solution);
        }
    }

    #[test]
    fn bfs_is_optimal_on_all_small_grids() {
        for (m, n) in [(2, 2), (2, 3), (3, 2), (1, 4)] {
            let bfs = solver(Strategy::Bfs);
            for (state, dist) in distances(m, n) {
                let grid = grid_from_flat(n, &state);
                let solution = bfs.solve(&grid).unwrap();
                assert_eq!(solution.len(), dist, "{:?}", state);
                assert_sorts(&grid, &solution);
            }
        }
    }

    #[test]
    fn ida_star_matches_bfs_on_2x2() {
        let ida = solver(Strategy::IdaStar);
        for (state, dist) in distances(2, 2) {
            let grid = grid_from_flat(2, &state);
            let solution = ida.solve(&grid).unwrap();
            assert_eq!(solution.len(), dist, "{:?}", state);
            assert_sorts(&grid, &solution);
        }
    }

    #[test]
    fn ida_star_matches_bfs_on_sampled_2x3() {
        let table = distances(2, 3);
        let ida = solver(Strategy::IdaStar);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..10 {
            let grid = Grid::create_random_with(2, 3, &mut rng).unwrap();
            let solution = ida.solve(&grid).unwrap();
            assert_eq!(solution.len(), table[grid.as_slice()]);
            assert_sorts(&grid, &solution);
        }
    }

    #[test]
    fn greedy_sorts_large_random_grids() {
        let greedy = solver(Strategy::Greedy);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = Grid::create_random_with(7, 5, &mut rng).unwrap();
            let solution = greedy.solve(&grid).unwrap();
            assert_sorts(&grid, &solution);
            assert!(solution.len() <= grid.len() * (grid.rows() + grid.cols()));
        }
    }

    #[test]
    fn greedy_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(3);
        let grid = Grid::create_random_with(4, 4, &mut rng).unwrap();
        let greedy = solver(Strategy::Greedy);
        assert_eq!(greedy.solve(&grid).unwrap(), greedy.solve(&grid).unwrap());
    }

    #[test]
    fn auto_picks_tier_by_size() {
        let auto = Solver::default();
        assert_eq!(auto.tier_for(9), Tier::Bfs);
        assert_eq!(auto.tier_for(10), Tier::Greedy);

        let wide = Solver::new(SolverConfig::default().with_exact_max_cells(12));
        assert_eq!(wide.tier_for(12), Tier::Bfs);
    }

    #[test]
    fn bfs_respects_state_limit() {
        let grid = Grid::new(vec![vec![9, 8, 7], vec![6, 5, 4], vec![3, 2, 1]]).unwrap();
        let bfs = Solver::new(
            SolverConfig::default()
                .with_strategy(Strategy::Bfs)
                .with_max_states(50),
        );
        assert!(matches!(
            bfs.solve(&grid),
            Err(GridError::SearchLimit { limit: 50 })
        ));
    }

    #[test]
    fn ida_star_respects_expansion_limit() {
        let grid = Grid::new(vec![vec![9, 8, 7], vec![6, 5, 4], vec![3, 2, 1]]).unwrap();
        let ida = Solver::new(
            SolverConfig::default()
                .with_strategy(Strategy::IdaStar)
                .with_max_expansions(100),
        );
        assert!(matches!(
            ida.solve(&grid),
            Err(GridError::SearchLimit { limit: 100 })
        ));
    }

    #[test]
    fn free_region_skips_fixed_cells() {
        let board = Board::ranked(&Grid::create_sorted(2, 3).unwrap()).unwrap();
        let graph = free_region(&board, 2);

        assert_eq!(graph.nodes(), &[(0, 2), (1, 0), (1, 1), (1, 2)]);
        assert!(!graph.contains(&(0, 1)));
        assert_eq!(graph.bfs(&(1, 0), &(0, 2)).map(|p| p.len()), Some(4));
    }
}
