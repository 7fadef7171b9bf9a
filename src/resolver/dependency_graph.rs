//! Dependency graph used to order parameter and symbol evaluation.
//!
//! This module provides the graph data structure and algorithms needed to
//! order evaluation so that every vertex is evaluated after the vertices it
//! depends on, to find one representative cycle for diagnostics, and to
//! compute everything that transitively depends on a set of seed vertices.
//!
//! Vertices keep their insertion order. Sorting is Kahn-style and always picks
//! the earliest-inserted ready vertex, so the produced order is reproducible.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Returned when a total order cannot be produced.
///
/// `unordered` holds every vertex that could not be placed: the vertices on a
/// cycle and everything that depends on one, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError<T> {
    pub unordered: Vec<T>,
}

impl<T: fmt::Display> fmt::Display for CycleError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.unordered.iter().map(ToString::to_string).collect::<Vec<_>>();
        write!(f, "cannot order vertices involved in a dependency cycle: {}", names.join(", "))
    }
}

impl<T: fmt::Debug + fmt::Display> std::error::Error for CycleError<T> {}

/// Directed dependency graph over arbitrary identity-comparable vertices.
///
/// An edge `v -> d` means `v` depends on `d`: `d` must be evaluated first.
#[derive(Debug, Clone)]
pub struct DependencyGraph<T>
where
    T: Clone + Eq + Hash,
{
    /// The underlying directed graph. Node indices follow insertion order.
    graph: DiGraph<T, ()>,
    /// Map from vertices to their graph indices.
    node_map: HashMap<T, NodeIndex>,
}

impl<T> DependencyGraph<T>
where
    T: Clone + Eq + Hash,
{
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Add a vertex if it doesn't already exist and return its index.
    fn ensure_node(&mut self, vertex: T) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&vertex) {
            index
        } else {
            let index = self.graph.add_node(vertex.clone());
            self.node_map.insert(vertex, index);
            index
        }
    }

    /// Add a vertex without dependencies.
    ///
    /// Vertices that never appear in an edge still take part in sorting.
    pub fn add_vertex(&mut self, vertex: T) {
        self.ensure_node(vertex);
    }

    /// Record that `vertex` must be evaluated after `depends_on`.
    pub fn add_edge(&mut self, vertex: T, depends_on: T) {
        let from_idx = self.ensure_node(vertex);
        let to_idx = self.ensure_node(depends_on);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Order all vertices so that each appears after everything it depends on.
    ///
    /// Uses Kahn's algorithm; among vertices whose dependencies are all
    /// resolved, the earliest inserted one is emitted first.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] listing the vertices that could not be placed
    /// when the graph contains a cycle.
    pub fn try_topological_sort(&self) -> Result<Vec<T>, CycleError<T>> {
        let mut unresolved: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Outgoing).count()))
            .collect();

        let mut ready: BTreeSet<NodeIndex> =
            unresolved.iter().filter(|(_, count)| **count == 0).map(|(idx, _)| *idx).collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(current) = ready.pop_first() {
            order.push(self.graph[current].clone());
            for dependent in self.graph.neighbors_directed(current, Direction::Incoming) {
                if let Some(count) = unresolved.get_mut(&dependent) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() == self.graph.node_count() {
            return Ok(order);
        }

        let placed: HashSet<&T> = order.iter().collect();
        let unordered = self
            .graph
            .node_indices()
            .map(|idx| &self.graph[idx])
            .filter(|vertex| !placed.contains(vertex))
            .cloned()
            .collect();
        Err(CycleError {
            unordered,
        })
    }

    /// Find one cycle in the graph using DFS with colors.
    ///
    /// Returns the vertices along the cycle with the first vertex repeated at
    /// the end, or `None` when the graph is acyclic. Independent of whether a
    /// sort of this graph (or of a subgraph) succeeded.
    pub fn detect_cycle(&self) -> Option<Vec<T>> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|idx| (idx, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                return Some(cycle.into_iter().map(|idx| self.graph[idx].clone()).collect());
            }
        }

        None
    }

    /// DFS visit for cycle detection.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        // Visit in insertion order so the reported cycle is stable.
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.sort();

        for neighbor in neighbors {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let cycle_start = path.iter().position(|idx| *idx == neighbor)?;
                    let mut cycle = path[cycle_start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Whether the graph contains at least one cycle.
    pub fn has_cycle(&self) -> bool {
        self.detect_cycle().is_some()
    }

    /// Build the subgraph of every vertex that directly or indirectly depends
    /// on any of `seeds`.
    ///
    /// Seeds that are not part of the graph are ignored. When `include_seeds`
    /// is false the seeds themselves are left out unless they also depend on
    /// another seed. Vertex insertion order and the edges between retained
    /// vertices are preserved.
    pub fn subgraph_dependent_on<'a, I>(&self, seeds: I, include_seeds: bool) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let seed_indices: Vec<NodeIndex> =
            seeds.into_iter().filter_map(|seed| self.node_map.get(seed).copied()).collect();

        let mut retained: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        if include_seeds {
            retained.extend(seed_indices.iter().copied());
        }
        queue.extend(seed_indices.iter().copied());

        while let Some(current) = queue.pop_front() {
            for dependent in self.graph.neighbors_directed(current, Direction::Incoming) {
                if retained.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        let mut subgraph = Self::new();
        for idx in self.graph.node_indices().filter(|idx| retained.contains(idx)) {
            subgraph.add_vertex(self.graph[idx].clone());
        }
        for edge in self.graph.raw_edges() {
            if retained.contains(&edge.source()) && retained.contains(&edge.target()) {
                subgraph.add_edge(
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                );
            }
        }
        subgraph
    }

    /// Get direct dependencies of a vertex, in insertion order.
    pub fn direct_dependencies(&self, vertex: &T) -> Vec<T> {
        let Some(&idx) = self.node_map.get(vertex) else {
            return Vec::new();
        };
        let mut deps: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        deps.sort();
        deps.into_iter().map(|dep| self.graph[dep].clone()).collect()
    }

    /// Whether the vertex is part of the graph.
    pub fn contains(&self, vertex: &T) -> bool {
        self.node_map.contains_key(vertex)
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Get the total number of vertices in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the total number of edges (dependencies) in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All vertices in insertion order.
    pub fn vertices(&self) -> Vec<T> {
        self.graph.node_indices().map(|idx| self.graph[idx].clone()).collect()
    }
}

impl<T> Default for DependencyGraph<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
