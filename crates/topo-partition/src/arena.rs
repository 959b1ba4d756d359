// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dense integer indices for string node ids.
//!
//! Index `i` is the `i`-th node in graph load order. An arena lives for a
//! single partitioning call; only node ids ever leave it.

use crate::{Assignment, PartitionId};
use std::collections::HashMap;
use topo_graph::{graph::Validated, Graph, NodeId};

/// Unweighted graph arrays handed to METIS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Csr {
    pub(crate) xadj: Vec<metis::Idx>,
    pub(crate) adjncy: Vec<metis::Idx>,
}

impl Csr {
    pub(crate) fn node_count(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    /// Undirected edges; every edge is stored once per direction.
    pub(crate) fn edge_count(&self) -> usize {
        self.adjncy.len() / 2
    }
}

pub(crate) struct IndexArena<'g> {
    ids: &'g [NodeId],
    index: HashMap<&'g str, usize>,
}

impl<'g> IndexArena<'g> {
    pub(crate) fn build(graph: &'g Graph<Validated>) -> Self {
        let ids = graph.nodes();
        let index = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        Self { ids, index }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn index_of(&self, node: &str) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub(crate) fn node(&self, index: usize) -> &'g NodeId {
        &self.ids[index]
    }

    /// Per-index neighbour lists, sorted by neighbour id.
    pub(crate) fn adjacency(&self, graph: &Graph<Validated>) -> Vec<Vec<usize>> {
        self.ids
            .iter()
            .map(|id| {
                graph
                    .neighbors(id)
                    .filter_map(|nb| self.index_of(nb))
                    .collect()
            })
            .collect()
    }

    /// Compressed sparse row arrays in METIS layout: the neighbours of
    /// index `u` are `adjncy[xadj[u]..xadj[u + 1]]`.
    pub(crate) fn csr(&self, graph: &Graph<Validated>) -> Csr {
        let mut xadj = Vec::with_capacity(self.len() + 1);
        xadj.push(0);
        let mut adjncy = Vec::new();
        for neighbors in self.adjacency(graph) {
            adjncy.extend(neighbors.into_iter().map(|nb| nb as metis::Idx));
            xadj.push(adjncy.len() as metis::Idx);
        }
        Csr { xadj, adjncy }
    }

    /// Maps per-index partition ids back onto node ids.
    pub(crate) fn assignment(&self, parts: &[PartitionId]) -> Assignment {
        parts
            .iter()
            .enumerate()
            .map(|(i, &p)| (self.node(i).clone(), p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_graph::TopoLoader;

    #[test]
    fn test_indices_follow_load_order() {
        let g = TopoLoader::parse("z y x\nz y\ny x\n").unwrap();
        let arena = IndexArena::build(&g);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.index_of("z"), Some(0));
        assert_eq!(arena.index_of("x"), Some(2));
        assert_eq!(arena.index_of("w"), None);
        assert_eq!(arena.node(1), "y");
    }

    #[test]
    fn test_csr_is_consistent() {
        let g = TopoLoader::parse("a b c d\na b\nb c\nc d\nd a\na c\n").unwrap();
        let csr = IndexArena::build(&g).csr(&g);
        assert_eq!(csr.node_count(), 4);
        assert_eq!(csr.edge_count(), 5);
        assert_eq!(csr.xadj, vec![0, 3, 5, 8, 10]);
        assert_eq!(csr.adjncy[..3], [1, 2, 3]);
        assert_eq!(*csr.xadj.last().unwrap() as usize, csr.adjncy.len());
    }

    #[test]
    fn test_assignment_round_trip() {
        let g = TopoLoader::parse("a b c\na b\nb c\n").unwrap();
        let arena = IndexArena::build(&g);
        let a = arena.assignment(&[1, 0, 1]);
        assert_eq!(a.get("a"), Some(1));
        assert_eq!(a.get("b"), Some(0));
        assert_eq!(a.get("c"), Some(1));
    }
}
