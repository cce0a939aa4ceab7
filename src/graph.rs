//! Undirected graphs stored as adjacency lists.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{GraphError, Result};

/// An undirected graph. Nodes can be any hashable value.
///
/// Edges are unique unordered pairs; neighbour lists keep insertion order,
/// which is also the order `bfs` explores them in.
#[derive(Debug, Clone)]
pub struct Graph<N> {
    nodes: Vec<N>,
    adjacency: HashMap<N, Vec<N>>,
    edges: Vec<(N, N)>,
    edge_set: HashSet<(N, N)>,
}

impl<N> Default for Graph<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            adjacency: HashMap::new(),
            edges: Vec::new(),
            edge_set: HashSet::new(),
        }
    }
}

impl<N> Graph<N>
where
    N: Clone + Eq + Hash + fmt::Debug,
{
    /// A graph with the given nodes and no edges.
    pub fn new<I: IntoIterator<Item = N>>(nodes: I) -> Self {
        let mut graph = Self::default();
        for node in nodes {
            graph.add_node(node);
        }
        graph
    }

    /// Adds `node` if it is not already present.
    pub fn add_node(&mut self, node: N) {
        if !self.adjacency.contains_key(&node) {
            self.adjacency.insert(node.clone(), Vec::new());
            self.nodes.push(node);
        }
    }

    /// Adds an undirected edge, inserting missing endpoints.
    ///
    /// Fails if `u == v` or if the edge is already present in either
    /// direction.
    pub fn add_edge(&mut self, u: N, v: N) -> Result<(), GraphError> {
        if u == v {
            return Err(GraphError::SelfLoop(format!("{:?}", u)));
        }
        if self.edge_set.contains(&(u.clone(), v.clone())) {
            return Err(GraphError::EdgeAlreadyExists(
                format!("{:?}", u),
                format!("{:?}", v),
            ));
        }

        self.add_node(u.clone());
        self.add_node(v.clone());

        if let Some(list) = self.adjacency.get_mut(&u) {
            list.push(v.clone());
        }
        if let Some(list) = self.adjacency.get_mut(&v) {
            list.push(u.clone());
        }

        self.edge_set.insert((u.clone(), v.clone()));
        self.edge_set.insert((v.clone(), u.clone()));
        self.edges.push((u, v));
        Ok(())
    }

    pub fn contains(&self, node: &N) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn neighbors(&self, node: &N) -> &[N] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn edges(&self) -> &[(N, N)] {
        &self.edges
    }

    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nb_edges(&self) -> usize {
        self.edges.len()
    }

    /// Shortest path from `src` to `dst`, both included.
    ///
    /// Returns `None` when `dst` cannot be reached or either node is absent.
    pub fn bfs(&self, src: &N, dst: &N) -> Option<Vec<N>> {
        if !self.contains(src) || !self.contains(dst) {
            return None;
        }

        let mut parent: HashMap<&N, &N> = HashMap::new();
        let mut seen: HashSet<&N> = HashSet::from([src]);
        let mut queue = VecDeque::from([src]);

        while let Some(node) = queue.pop_front() {
            if node == dst {
                let mut path = vec![node.clone()];
                let mut current = node;
                while let Some(&prev) = parent.get(current) {
                    path.push(prev.clone());
                    current = prev;
                }
                path.reverse();
                return Some(path);
            }

            for next in self.neighbors(node) {
                if seen.insert(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

impl Graph<u32> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let graph = Self::parse(BufReader::new(File::open(path)?))?;
        info!(
            path = %path.display(),
            nodes = graph.nb_nodes(),
            edges = graph.nb_edges(),
            "loaded graph"
        );
        Ok(graph)
    }

    /// Reads a header `n m` followed by `m` lines `node1 node2`. Nodes are
    /// named `1..=n`.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, GraphError> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.unwrap_or_default();
        let (n, m) = parse_pair(&header, 1)?;

        // Edge lines are read before any node is created, so a truncated
        // file fails without allocating for the header's counts.
        let mut edges = Vec::new();
        for i in 0..m as usize {
            let line = i + 2;
            let text = lines.next().transpose()?.ok_or_else(|| GraphError::Format {
                line,
                reason: format!("expected {} edges, found {}", m, i),
            })?;
            edges.push(parse_pair(&text, line)?);
        }

        let mut graph = Graph::new(1..=n);
        for (u, v) in edges {
            graph.add_edge(u, v)?;
        }

        Ok(graph)
    }
}

fn parse_pair(text: &str, line: usize) -> Result<(u32, u32), GraphError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [a, b] = tokens[..] else {
        return Err(GraphError::Format {
            line,
            reason: format!("expected two tokens, found {}", tokens.len()),
        });
    };

    let parse = |token: &str| {
        token.parse::<u32>().map_err(|_| GraphError::Format {
            line,
            reason: format!("'{}' is not a node number", token),
        })
    };
    Ok((parse(a)?, parse(b)?))
}

impl<N: fmt::Debug> fmt::Display for Graph<N>
where
    N: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return write!(f, "The graph is empty");
        }

        writeln!(
            f,
            "The graph has {} nodes and {} edges.",
            self.nodes.len(),
            self.edges.len()
        )?;
        for node in &self.nodes {
            writeln!(f, "{:?}-->{:?}", node, self.adjacency[node])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph() -> Graph<u32> {
        let mut graph = Graph::new(1..=5);
        graph.add_edge(1, 2).unwrap();
        graph.add_edge(2, 3).unwrap();
        graph.add_edge(3, 4).unwrap();
        graph.add_edge(1, 4).unwrap();
        graph
    }

    #[test]
    fn counts_and_symmetry() {
        let graph = path_graph();
        assert_eq!(graph.nb_nodes(), 5);
        assert_eq!(graph.nb_edges(), 4);
        for (u, v) in graph.edges() {
            assert!(graph.neighbors(u).contains(v));
            assert!(graph.neighbors(v).contains(u));
        }
    }

    #[test]
    fn duplicate_edges_are_rejected() {
        let mut graph = path_graph();
        assert!(matches!(
            graph.add_edge(1, 2),
            Err(GraphError::EdgeAlreadyExists(..))
        ));
        assert!(matches!(
            graph.add_edge(2, 1),
            Err(GraphError::EdgeAlreadyExists(..))
        ));
        assert!(matches!(graph.add_edge(3, 3), Err(GraphError::SelfLoop(_))));
        assert_eq!(graph.nb_edges(), 4);
    }

    #[test]
    fn add_edge_inserts_missing_nodes() {
        let mut graph = Graph::default();
        graph.add_edge("a", "b").unwrap();
        assert_eq!(graph.nodes(), &["a", "b"]);
        assert_eq!(graph.nb_nodes(), 2);
    }

    #[test]
    fn bfs_finds_shortest_path() {
        let graph = path_graph();
        assert_eq!(graph.bfs(&1, &4), Some(vec![1, 4]));
        assert_eq!(graph.bfs(&2, &4), Some(vec![2, 1, 4]));
        assert_eq!(graph.bfs(&3, &3), Some(vec![3]));
    }

    #[test]
    fn bfs_reports_unreachable() {
        let graph = path_graph();
        assert_eq!(graph.bfs(&1, &5), None);
        assert_eq!(graph.bfs(&1, &42), None);
    }

    #[test]
    fn parse_reads_edges() {
        let text = "4 3\n1 2\n2 3\n3 4\n";
        let graph = Graph::<u32>::parse(text.as_bytes()).unwrap();
        assert_eq!(graph.nb_nodes(), 4);
        assert_eq!(graph.edges(), &[(1, 2), (2, 3), (3, 4)]);
        assert_eq!(graph.bfs(&1, &4), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn parse_rejects_bad_lines() {
        for text in ["", "3\n", "3 2\n1 2 3\n2 3\n", "3 2\n1 2\n", "3 1\n1 x\n", "4000000000 2\n1 2\n"] {
            assert!(
                matches!(Graph::<u32>::parse(text.as_bytes()), Err(GraphError::Format { .. })),
                "accepted {:?}",
                text
            );
        }
        assert!(matches!(
            Graph::<u32>::parse("3 2\n1 2\n2 1\n".as_bytes()),
            Err(GraphError::EdgeAlreadyExists(..))
        ));
    }

    #[test]
    fn display_lists_neighbours() {
        let mut graph = Graph::new([1, 2]);
        graph.add_edge(1, 2).unwrap();
        assert_eq!(
            graph.to_string(),
            "The graph has 2 nodes and 1 edges.\n1-->[2]\n2-->[1]\n"
        );
        assert_eq!(Graph::<u32>::default().to_string(), "The graph is empty");
    }
}
