// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `E_max(n)`: the heaviest per-VM edge load when a PM's subgraph is split
//! into `n` parts.
//!
//! # Edge accounting
//!
//! For every undirected edge `(u, v)` with `u < v`:
//!
//! ```text
//! same part      edge_count[part(u)] += 1
//! different      edge_count[part(u)] += 2
//!                dangling[part(u)]   += 1, dangling[part(v)] += 1
//! ```
//!
//! A cross edge is charged twice to the part of its lower endpoint and not
//! at all to the other part. The cost model was calibrated against this
//! accounting, so it is kept as is.

use crate::AllocError;
use std::collections::BTreeMap;
use topo_graph::{graph::Validated, Graph};
use topo_partition::{Assignment, Multilevel, PartitionId, Partitioner};
use tracing::info;

/// Node and edge counts of one part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub dangling_edges: usize,
}

/// Per-part statistics for every part that holds at least one node.
pub fn partition_stats(
    graph: &Graph<Validated>,
    assignment: &Assignment,
) -> BTreeMap<PartitionId, PartitionStats> {
    let mut stats: BTreeMap<PartitionId, PartitionStats> = BTreeMap::new();
    for node in graph.nodes() {
        if let Some(part) = assignment.get(node) {
            stats.entry(part).or_default().node_count += 1;
        }
    }
    for (u, v) in graph.edges() {
        let (Some(pu), Some(pv)) = (assignment.get(u), assignment.get(v)) else {
            continue;
        };
        if pu == pv {
            stats.entry(pu).or_default().edge_count += 1;
        } else {
            let su = stats.entry(pu).or_default();
            su.edge_count += 2;
            su.dangling_edges += 1;
            stats.entry(pv).or_default().dangling_edges += 1;
        }
    }
    stats
}

/// `n → E_max(n)` for `n` in `1..=max_parts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmaxTable {
    values: BTreeMap<usize, usize>,
}

impl EmaxTable {
    /// Partitions `graph` once per candidate part count.
    pub fn compute(
        graph: &Graph<Validated>,
        max_parts: usize,
        partitioner: &Multilevel,
    ) -> Result<Self, AllocError> {
        let mut values = BTreeMap::new();
        for n in 1..=max_parts {
            let assignment = partitioner.partition(graph, n)?;
            let e_max = partition_stats(graph, &assignment)
                .values()
                .map(|s| s.edge_count)
                .max()
                .unwrap_or(0);
            values.insert(n, e_max);
        }
        let table = Self { values };
        info!("E_max table: {table}");
        Ok(table)
    }

    /// Returns `E_max(n)`; part counts outside the table read as 0.
    pub fn get(&self, n: usize) -> usize {
        self.values.get(&n).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.values.iter().map(|(&n, &e)| (n, e))
    }
}

impl FromIterator<(usize, usize)> for EmaxTable {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for EmaxTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self.iter().map(|(n, e)| format!("{n}: {e}")).collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
