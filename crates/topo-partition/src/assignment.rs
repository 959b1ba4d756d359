// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node → partition mappings.

use crate::PartitionError;
use std::collections::{BTreeMap, BTreeSet};
use topo_graph::{graph::Validated, Graph, NodeId};

/// Index of a partition (a PM, a VM within a PM, or a global server).
pub type PartitionId = usize;

/// An immutable mapping from node id to partition id.
///
/// Partitioners always return a fresh `Assignment`; transformations such as
/// [`Assignment::offset`] produce new values.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Assignment {
    map: BTreeMap<NodeId, PartitionId>,
}

impl Assignment {
    /// Puts every node of `graph` into `partition`.
    pub fn uniform(graph: &Graph<Validated>, partition: PartitionId) -> Self {
        graph.nodes().iter().map(|n| (n.clone(), partition)).collect()
    }

    /// Returns the partition of `node`, if assigned.
    pub fn get(&self, node: &str) -> Option<PartitionId> {
        self.map.get(node).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates `(node, partition)` pairs in node-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, PartitionId)> + '_ {
        self.map.iter().map(|(n, &p)| (n, p))
    }

    /// Returns the set of partition ids actually used.
    pub fn partitions_used(&self) -> BTreeSet<PartitionId> {
        self.map.values().copied().collect()
    }

    /// Returns a copy with every partition id shifted by `by`.
    pub fn offset(&self, by: PartitionId) -> Self {
        self.map.iter().map(|(n, &p)| (n.clone(), p + by)).collect()
    }

    /// Combines assignments over disjoint node sets.
    ///
    /// # Errors
    /// [`PartitionError::InvalidAssignment`] if a node appears in both.
    pub fn merge(mut self, other: Assignment) -> Result<Self, PartitionError> {
        for (node, p) in other.map {
            if self.map.insert(node.clone(), p).is_some() {
                return Err(PartitionError::InvalidAssignment(format!(
                    "node '{node}' is assigned twice"
                )));
            }
        }
        Ok(self)
    }

    /// Checks that every node of `graph` is assigned to a partition in
    /// `0..partitions`, and nothing else is assigned.
    pub fn validate(
        &self,
        graph: &Graph<Validated>,
        partitions: usize,
    ) -> Result<(), PartitionError> {
        for node in graph.nodes() {
            match self.get(node) {
                None => {
                    return Err(PartitionError::InvalidAssignment(format!(
                        "node '{node}' is not assigned"
                    )))
                }
                Some(p) if p >= partitions => {
                    return Err(PartitionError::InvalidAssignment(format!(
                        "node '{node}' assigned to partition {p}, but only {partitions} exist"
                    )))
                }
                Some(_) => {}
            }
        }
        if self.len() != graph.node_count() {
            return Err(PartitionError::InvalidAssignment(format!(
                "{} nodes assigned, graph has {}",
                self.len(),
                graph.node_count()
            )));
        }
        Ok(())
    }
}

impl FromIterator<(NodeId, PartitionId)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (NodeId, PartitionId)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
