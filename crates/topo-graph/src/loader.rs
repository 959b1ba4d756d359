// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Topology loading from the two-section text format.
//!
//! Line 1 declares the nodes; every following non-blank line is one
//! undirected edge `<a> <b>`. Nodes that have no incident edge once the
//! whole file is read are dropped from the node list: the emulator never
//! instantiates them, and partitioners must not count them.

use crate::{graph, Graph, NodeId, TopoError};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

/// Loads a topology from disk into a validated [`Graph`].
///
/// # Example
/// ```no_run
/// use topo_graph::TopoLoader;
/// use std::path::Path;
///
/// let graph = TopoLoader::load(Path::new("./topo/clos_8.txt")).unwrap();
/// println!("Loaded {} nodes", graph.node_count());
/// ```
pub struct TopoLoader;

impl TopoLoader {
    /// Reads and parses the topology file at `path`.
    pub fn load(path: &Path) -> Result<Graph<graph::Validated>, TopoError> {
        let content = std::fs::read_to_string(path)?;
        let graph = Self::parse(&content)?;
        tracing::debug!("loaded '{}': {}", path.display(), graph.summary());
        Ok(graph)
    }

    /// Parses topology text.
    ///
    /// # Errors
    /// - [`TopoError::MalformedLine`] if an edge line does not have exactly
    ///   two tokens.
    /// - [`TopoError::Format`] if an edge references an undeclared node.
    /// - [`TopoError::SelfLoop`] if an edge joins a node to itself.
    pub fn parse(content: &str) -> Result<Graph<graph::Validated>, TopoError> {
        let mut lines = content.lines().enumerate();

        let declared: Vec<NodeId> = match lines.next() {
            Some((_, header)) => header.split_whitespace().map(str::to_string).collect(),
            None => Vec::new(),
        };

        let mut nodes = Vec::with_capacity(declared.len());
        let mut seen = HashSet::with_capacity(declared.len());
        for node in declared {
            if seen.insert(node.clone()) {
                nodes.push(node);
            }
        }

        let mut adjacency: HashMap<NodeId, BTreeSet<NodeId>> = HashMap::new();
        for (idx, line) in lines {
            let line_no = idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            let &[a, b] = tokens.as_slice() else {
                return Err(TopoError::MalformedLine {
                    line: line_no,
                    found: tokens.len(),
                });
            };

            for endpoint in [a, b] {
                if !seen.contains(endpoint) {
                    return Err(TopoError::Format {
                        line: line_no,
                        detail: format!("edge references undeclared node '{endpoint}'"),
                    });
                }
            }
            if a == b {
                return Err(TopoError::SelfLoop {
                    line: line_no,
                    node: a.to_string(),
                });
            }

            adjacency
                .entry(a.to_string())
                .or_default()
                .insert(b.to_string());
            adjacency
                .entry(b.to_string())
                .or_default()
                .insert(a.to_string());
        }

        let before = nodes.len();
        nodes.retain(|n| adjacency.get(n).is_some_and(|nb| !nb.is_empty()));
        let pruned = before - nodes.len();
        if pruned > 0 {
            tracing::debug!("pruned {pruned} node(s) without neighbours");
        }

        Graph::new(nodes, adjacency).validate()
    }
}
