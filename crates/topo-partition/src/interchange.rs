// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Weighted graph interchange file read by the external solver.
//!
//! ```text
//! <node count> <edge count> 1
//! % node_name: <id of node 1>
//! <neighbour> 1 <neighbour> 1 ...
//! % node_name: <id of node 2>
//! ...
//! ```
//!
//! Nodes are numbered from 1 in graph load order; each adjacency line lists
//! neighbour numbers with unit edge weight. The edge count counts every
//! undirected edge once.

use crate::arena::IndexArena;
use crate::PartitionError;
use std::fmt::Write as _;
use std::path::Path;
use topo_graph::{graph::Validated, Graph};

/// Renders `graph` in interchange format.
pub fn render(graph: &Graph<Validated>) -> String {
    render_with(&IndexArena::build(graph), graph)
}

pub(crate) fn render_with(arena: &IndexArena<'_>, graph: &Graph<Validated>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} 1", graph.node_count(), graph.edge_count());
    for (i, neighbors) in arena.adjacency(graph).into_iter().enumerate() {
        let _ = writeln!(out, "% node_name: {}", arena.node(i));
        let line: Vec<String> = neighbors.iter().map(|nb| format!("{} 1", nb + 1)).collect();
        let _ = writeln!(out, "{}", line.join(" "));
    }
    out
}

pub(crate) fn write_with(
    arena: &IndexArena<'_>,
    graph: &Graph<Validated>,
    path: &Path,
) -> Result<(), PartitionError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_with(arena, graph))?;
    tracing::debug!("wrote interchange graph to '{}'", path.display());
    Ok(())
}
