// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Splitting a topology across physical machines.

use crate::strategy::Partitioner;
use crate::{Assignment, PartitionError, PartitionId};
use std::collections::BTreeMap;
use topo_graph::{graph::Validated, Graph, NodeId};
use tracing::{info, warn};

/// Index of a physical machine.
pub type PmId = PartitionId;

/// The result of PM-level partitioning.
///
/// Holds the node → PM mapping together with the derived per-PM views:
/// member nodes (in graph load order), the induced subgraph, and the list
/// of edges whose endpoints sit on different PMs. Every PM in
/// `0..pm_count` has an entry, possibly empty.
#[derive(Debug, Clone)]
pub struct PmPartition {
    pm_count: usize,
    node_to_pm: Assignment,
    pm_nodes: BTreeMap<PmId, Vec<NodeId>>,
    pm_graphs: BTreeMap<PmId, Graph<Validated>>,
    cross_pm_edges: Vec<(NodeId, NodeId)>,
}

impl PmPartition {
    /// Derives the per-PM views from a validated assignment.
    ///
    /// # Errors
    /// [`PartitionError::InvalidAssignment`] if `assignment` misses a node
    /// or names a PM outside `0..pm_count`.
    pub fn from_assignment(
        graph: &Graph<Validated>,
        assignment: Assignment,
        pm_count: usize,
    ) -> Result<Self, PartitionError> {
        if pm_count == 0 {
            return Err(PartitionError::InvalidPartitionCount(pm_count));
        }
        assignment.validate(graph, pm_count)?;

        let mut pm_nodes: BTreeMap<PmId, Vec<NodeId>> =
            (0..pm_count).map(|pm| (pm, Vec::new())).collect();
        for node in graph.nodes() {
            if let Some(pm) = assignment.get(node) {
                pm_nodes.entry(pm).or_default().push(node.clone());
            }
        }

        let pm_graphs = pm_nodes
            .iter()
            .map(|(&pm, nodes)| (pm, graph.induced_subgraph(nodes)))
            .collect();

        let cross_pm_edges = graph
            .edges()
            .filter(|(u, v)| assignment.get(u) != assignment.get(v))
            .map(|(u, v)| (u.clone(), v.clone()))
            .collect();

        let partition = Self {
            pm_count,
            node_to_pm: assignment,
            pm_nodes,
            pm_graphs,
            cross_pm_edges,
        };
        partition.log_summary();
        Ok(partition)
    }

    fn log_summary(&self) {
        for (pm, g) in &self.pm_graphs {
            if g.is_empty() {
                warn!("PM {pm} received no nodes");
            } else {
                info!("PM {pm}: {} nodes, {} edges", g.node_count(), g.edge_count());
            }
        }
        info!(
            "{} cross-PM edge(s) across {} PM(s)",
            self.cross_pm_edges.len(),
            self.pm_count
        );
    }

    pub fn pm_count(&self) -> usize {
        self.pm_count
    }

    pub fn assignment(&self) -> &Assignment {
        &self.node_to_pm
    }

    /// Returns the PM hosting `node`.
    pub fn pm_of(&self, node: &str) -> Option<PmId> {
        self.node_to_pm.get(node)
    }

    /// Member nodes of `pm` in graph load order.
    pub fn nodes(&self, pm: PmId) -> &[NodeId] {
        self.pm_nodes.get(&pm).map_or(&[], Vec::as_slice)
    }

    /// The subgraph induced by the members of `pm`.
    pub fn subgraph(&self, pm: PmId) -> Option<&Graph<Validated>> {
        self.pm_graphs.get(&pm)
    }

    pub fn node_count(&self, pm: PmId) -> usize {
        self.nodes(pm).len()
    }

    pub fn edge_count(&self, pm: PmId) -> usize {
        self.subgraph(pm).map_or(0, Graph::edge_count)
    }

    /// Iterates `(pm, subgraph)` in ascending PM order.
    pub fn subgraphs(&self) -> impl Iterator<Item = (PmId, &Graph<Validated>)> + '_ {
        self.pm_graphs.iter().map(|(&pm, g)| (pm, g))
    }

    /// Edges whose endpoints are on different PMs, in graph edge order.
    pub fn cross_pm_edges(&self) -> &[(NodeId, NodeId)] {
        &self.cross_pm_edges
    }

    /// Returns a one-line summary for logging.
    pub fn summary(&self) -> String {
        let sizes: Vec<String> = (0..self.pm_count)
            .map(|pm| self.node_count(pm).to_string())
            .collect();
        format!(
            "{} PMs, sizes [{}], {} cross-PM edges",
            self.pm_count,
            sizes.join(", "),
            self.cross_pm_edges.len()
        )
    }
}

/// Partitions `graph` across `pm_count` physical machines.
///
/// With a single PM no strategy runs: every node goes to PM 0.
pub fn partition_across_pms<P>(
    strategy: &P,
    graph: &Graph<Validated>,
    pm_count: usize,
) -> Result<PmPartition, PartitionError>
where
    P: Partitioner + ?Sized,
{
    if pm_count == 0 {
        return Err(PartitionError::InvalidPartitionCount(pm_count));
    }
    if graph.is_empty() {
        return Err(PartitionError::EmptyGraph);
    }

    let assignment = if pm_count == 1 {
        info!("single PM: skipping '{}' partitioning", strategy.name());
        Assignment::uniform(graph, 0)
    } else {
        info!(
            "partitioning {} nodes across {pm_count} PMs with '{}'",
            graph.node_count(),
            strategy.name()
        );
        strategy.partition(graph, pm_count)?
    };

    PmPartition::from_assignment(graph, assignment, pm_count)
}
