//! Swap puzzle CLI.
//!
//! Commands:
//! - solve: Load a grid from a file and solve it
//! - random: Generate a shuffled grid and solve it
//! - graph: Load a graph and print a shortest path

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use swap_puzzle::{Graph, Grid, Solver, SolverConfig, Strategy, Swap};

#[derive(Parser)]
#[command(name = "swap-puzzle")]
#[command(version)]
#[command(about = "Sort a grid with adjacent swaps")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SolveArgs {
    /// Search strategy
    #[arg(long, value_enum, default_value_t = Strategy::Auto)]
    strategy: Strategy,

    /// Largest grid, in cells, solved exactly under the auto strategy
    #[arg(long, default_value = "9")]
    exact_max_cells: usize,

    /// Visited-state cap for breadth-first search
    #[arg(long, default_value = "1000000")]
    max_states: usize,

    /// Print the swaps as JSON instead of replaying them
    #[arg(long)]
    json: bool,
}

impl SolveArgs {
    fn config(&self) -> SolverConfig {
        SolverConfig::default()
            .with_strategy(self.strategy)
            .with_exact_max_cells(self.exact_max_cells)
            .with_max_states(self.max_states)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a grid read from a file
    Solve {
        /// Grid file: a header "m n" then m rows of n integers
        file: PathBuf,

        #[command(flatten)]
        args: SolveArgs,
    },
    /// Solve a randomly shuffled grid
    Random {
        /// Number of rows
        #[arg(long, default_value = "3")]
        rows: usize,

        /// Number of columns
        #[arg(long, default_value = "3")]
        cols: usize,

        /// Seed for reproducible shuffles
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        args: SolveArgs,
    },
    /// Print a shortest path between two nodes of a graph file
    Graph {
        /// Graph file: a header "n m" then m lines "node1 node2"
        file: PathBuf,

        #[arg(long)]
        from: u32,

        #[arg(long)]
        to: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Solve { file, args } => {
            let grid = Grid::from_file(&file)
                .with_context(|| format!("failed to load grid from {}", file.display()))?;
            run_solver(grid, &args)
        }
        Commands::Random {
            rows,
            cols,
            seed,
            args,
        } => {
            let grid = match seed {
                Some(seed) => Grid::create_random_with(rows, cols, &mut StdRng::seed_from_u64(seed)),
                None => Grid::create_random(rows, cols),
            }
            .context("failed to generate grid")?;
            run_solver(grid, &args)
        }
        Commands::Graph { file, from, to } => {
            let graph = Graph::<u32>::from_file(&file)
                .with_context(|| format!("failed to load graph from {}", file.display()))?;
            match graph.bfs(&from, &to) {
                Some(path) => {
                    let nodes: Vec<String> = path.iter().map(ToString::to_string).collect();
                    println!("{}", nodes.join(" -> "));
                }
                None => println!("{} is unreachable from {}", to, from),
            }
            Ok(())
        }
    }
}

fn run_solver(grid: Grid, args: &SolveArgs) -> Result<()> {
    let solver = Solver::new(args.config());
    let solution = solver.solve(&grid).context("failed to solve grid")?;
    info!(swaps = solution.len(), strategy = ?args.strategy, "solved");

    if args.json {
        println!("{}", serde_json::to_string(&solution)?);
        return Ok(());
    }

    println!("Initial grid:\n{}", render(&grid, None));
    println!("Found a solution with {} swaps", solution.len());

    let mut replay = grid;
    for &swap in &solution {
        replay.swap(swap.0, swap.1)?;
        println!("{:?} <-> {:?}\n{}", swap.0, swap.1, render(&replay, Some(swap)));
    }

    anyhow::ensure!(replay.is_sorted(), "replayed solution left the grid unsorted");
    Ok(())
}

/// Renders the grid with the cells of `swap` highlighted.
fn render(grid: &Grid, swap: Option<Swap>) -> String {
    let width = grid
        .as_slice()
        .iter()
        .map(|v| v.to_string().len())
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    for i in 0..grid.rows() {
        for j in 0..grid.cols() {
            let text = format!("{:>width$}", grid.get((i, j)).unwrap_or_default());
            let touched = swap.is_some_and(|(a, b)| a == (i, j) || b == (i, j));
            if touched {
                out.push_str(&text.bold().yellow().to_string());
            } else {
                out.push_str(&text);
            }
            out.push(' ');
        }
        out.push('\n');
    }
    out
}
