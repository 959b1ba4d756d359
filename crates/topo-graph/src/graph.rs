// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Topology graph: ordered nodes and symmetric adjacency.
//!
//! # Type-State Pattern
//!
//! ```text
//! Graph<Parsed>     — nodes and adjacency collected, not yet checked.
//!       │  .validate()
//!       ▼
//! Graph<Validated>  — symmetric, loop-free, no dangling neighbours.
//! ```
//!
//! Partitioners only accept `Graph<Validated>`, so an inconsistent
//! adjacency can never reach them. Once validated, a graph is read-only.

use crate::TopoError;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Opaque node identifier, unique within a topology.
pub type NodeId = String;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been assembled but not validated.
#[derive(Debug, Clone)]
pub struct Parsed;

/// Marker: graph has been validated and is ready for partitioning.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Parsed {}
impl GraphState for Validated {}

// ── Graph ──────────────────────────────────────────────────────────

/// An undirected topology graph.
///
/// `nodes` keeps load order, which is only used to make iteration
/// deterministic. Neighbour sets are ordered so that edge enumeration is
/// reproducible across runs.
#[derive(Debug, Clone)]
pub struct Graph<S: GraphState = Parsed> {
    nodes: Vec<NodeId>,
    adjacency: HashMap<NodeId, BTreeSet<NodeId>>,
    _state: std::marker::PhantomData<S>,
}

// ── Parsed state ───────────────────────────────────────────────────

impl Graph<Parsed> {
    /// Creates a new graph in the `Parsed` state.
    ///
    /// Nodes missing from `adjacency` are treated as having no neighbours.
    pub fn new(nodes: Vec<NodeId>, adjacency: HashMap<NodeId, BTreeSet<NodeId>>) -> Self {
        Self {
            nodes,
            adjacency,
            _state: std::marker::PhantomData,
        }
    }

    /// Builds a graph from a node list and an undirected edge list.
    ///
    /// Every edge is inserted in both directions.
    pub fn from_edges<I, N>(nodes: Vec<NodeId>, edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
        N: Into<NodeId>,
    {
        let mut adjacency: HashMap<NodeId, BTreeSet<NodeId>> = HashMap::new();
        for (u, v) in edges {
            let (u, v) = (u.into(), v.into());
            adjacency.entry(u.clone()).or_default().insert(v.clone());
            adjacency.entry(v).or_default().insert(u);
        }
        Self::new(nodes, adjacency)
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - No duplicate node ids.
    /// - No self-loops.
    /// - Every neighbour is a declared node.
    /// - Adjacency is symmetric.
    pub fn validate(mut self) -> Result<Graph<Validated>, TopoError> {
        let mut declared = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !declared.insert(node.as_str()) {
                return Err(TopoError::InvalidGraph(format!(
                    "node '{node}' is declared more than once"
                )));
            }
        }

        for (node, neighbors) in &self.adjacency {
            if !declared.contains(node.as_str()) {
                return Err(TopoError::InvalidGraph(format!(
                    "adjacency entry for undeclared node '{node}'"
                )));
            }
            for neighbor in neighbors {
                if neighbor == node {
                    return Err(TopoError::InvalidGraph(format!(
                        "self-loop on node '{node}'"
                    )));
                }
                if !declared.contains(neighbor.as_str()) {
                    return Err(TopoError::InvalidGraph(format!(
                        "node '{node}' references undeclared neighbour '{neighbor}'"
                    )));
                }
                let symmetric = self
                    .adjacency
                    .get(neighbor)
                    .is_some_and(|back| back.contains(node));
                if !symmetric {
                    return Err(TopoError::InvalidGraph(format!(
                        "edge '{node}' -> '{neighbor}' has no reverse entry"
                    )));
                }
            }
        }

        for node in &self.nodes {
            self.adjacency.entry(node.clone()).or_default();
        }

        Ok(Graph {
            nodes: self.nodes,
            adjacency: self.adjacency,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl Graph<Validated> {
    /// Returns an empty validated graph.
    pub fn empty() -> Self {
        Graph {
            nodes: Vec::new(),
            adjacency: HashMap::new(),
            _state: std::marker::PhantomData,
        }
    }

    /// Returns the nodes in load order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `node` belongs to the graph.
    pub fn contains(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Returns the neighbours of `node` in ascending id order.
    ///
    /// Unknown nodes have no neighbours.
    pub fn neighbors<'a>(&'a self, node: &str) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.adjacency.get(node).into_iter().flatten()
    }

    /// Returns the degree of `node`, or 0 if it is unknown.
    pub fn degree(&self, node: &str) -> usize {
        self.adjacency.get(node).map_or(0, BTreeSet::len)
    }

    /// Returns `true` if `u` and `v` are adjacent.
    pub fn has_edge(&self, u: &str, v: &str) -> bool {
        self.adjacency.get(u).is_some_and(|n| n.contains(v))
    }

    /// Iterates every undirected edge exactly once as `(u, v)` with `u < v`.
    ///
    /// Edges are produced in node load order, then in ascending neighbour
    /// order. Every consumer that allocates ids per edge relies on this
    /// order being stable.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> + '_ {
        self.nodes.iter().flat_map(move |u| {
            self.neighbors(u)
                .filter(move |v| u.as_str() < v.as_str())
                .map(move |v| (u, v))
        })
    }

    /// Returns the largest node degree.
    pub fn max_degree(&self) -> usize {
        self.nodes.iter().map(|n| self.degree(n)).max().unwrap_or(0)
    }

    /// Returns the average node degree.
    pub fn average_degree(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        2.0 * self.edge_count() as f64 / self.nodes.len() as f64
    }

    /// Derives the subgraph induced by `subset`.
    ///
    /// Only edges whose endpoints are both in `subset` are kept. Nodes keep
    /// the graph's load order; ids in `subset` that are not part of the
    /// graph are ignored. Nodes left without neighbours are retained.
    pub fn induced_subgraph<'a, I>(&self, subset: I) -> Graph<Validated>
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let members: HashSet<&str> = subset
            .into_iter()
            .map(String::as_str)
            .filter(|n| self.contains(n))
            .collect();

        let nodes: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|n| members.contains(n.as_str()))
            .cloned()
            .collect();

        let adjacency = nodes
            .iter()
            .map(|n| {
                let kept = self
                    .neighbors(n)
                    .filter(|v| members.contains(v.as_str()))
                    .cloned()
                    .collect();
                (n.clone(), kept)
            })
            .collect();

        Graph {
            nodes,
            adjacency,
            _state: std::marker::PhantomData,
        }
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        format!(
            "Topology: {} nodes, {} edges, avg degree {:.2}, max degree {}",
            self.node_count(),
            self.edge_count(),
            self.average_degree(),
            self.max_degree(),
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for Graph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.nodes.join(" "))?;
        for u in &self.nodes {
            if let Some(neighbors) = self.adjacency.get(u) {
                for v in neighbors.iter().filter(|v| u.as_str() < v.as_str()) {
                    writeln!(f, "{u} {v}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn chain() -> Graph<Validated> {
        Graph::from_edges(ids(&["a", "b", "c"]), [("a", "b"), ("b", "c")])
            .validate()
            .unwrap()
    }

    #[test]
    fn test_validate_ok() {
        let g = chain();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_validate_duplicate_node() {
        let g = Graph::from_edges(ids(&["a", "a", "b"]), [("a", "b")]);
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_validate_dangling_neighbor() {
        let g = Graph::from_edges(ids(&["a"]), [("a", "z")]);
        assert!(matches!(g.validate(), Err(TopoError::InvalidGraph(_))));
    }

    #[test]
    fn test_validate_self_loop() {
        let g = Graph::from_edges(ids(&["a", "b"]), [("a", "a"), ("a", "b")]);
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_validate_asymmetric() {
        let mut adjacency = HashMap::new();
        adjacency.insert("a".to_string(), BTreeSet::from(["b".to_string()]));
        adjacency.insert("b".to_string(), BTreeSet::new());
        let g = Graph::new(ids(&["a", "b"]), adjacency);
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_edges_once_each() {
        let g = Graph::from_edges(
            ids(&["c", "a", "b"]),
            [("a", "b"), ("b", "c"), ("c", "a")],
        )
        .validate()
        .unwrap();
        let edges: Vec<_> = g.edges().map(|(u, v)| (u.as_str(), v.as_str())).collect();
        // Load order first (c has no larger neighbour), then a, then b.
        assert_eq!(edges, vec![("a", "b"), ("a", "c"), ("b", "c")]);
    }

    #[test]
    fn test_induced_subgraph() {
        let g = chain();
        let sub = g.induced_subgraph(&ids(&["a", "b"]));
        assert_eq!(sub.nodes(), &ids(&["a", "b"])[..]);
        assert_eq!(sub.edge_count(), 1);
        assert!(sub.has_edge("a", "b"));
        assert!(!sub.contains("c"));
    }

    #[test]
    fn test_induced_subgraph_keeps_isolated_members() {
        let g = chain();
        let sub = g.induced_subgraph(&ids(&["a", "c"]));
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_count(), 0);
        assert_eq!(sub.degree("a"), 0);
    }

    #[test]
    fn test_degrees() {
        let g = chain();
        assert_eq!(g.degree("b"), 2);
        assert_eq!(g.degree("missing"), 0);
        assert_eq!(g.max_degree(), 2);
        assert!((g.average_degree() - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary() {
        let s = chain().summary();
        assert!(s.contains("3 nodes"));
        assert!(s.contains("2 edges"));
    }

    #[test]
    fn test_display_is_topology_text() {
        let text = format!("{}", chain());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["a b c", "a b", "b c"]);
    }

    #[test]
    fn test_empty() {
        let g = Graph::empty();
        assert!(g.is_empty());
        assert_eq!(g.edges().count(), 0);
        assert_eq!(g.average_degree(), 0.0);
    }
}
