// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Uniform random placement.
//!
//! Every node independently lands on a partition drawn uniformly from
//! `0..k`. No balance or cut guarantees; useful as a baseline when
//! comparing traffic distribution factors.

use crate::strategy::Partitioner;
use crate::{Assignment, PartitionError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use topo_graph::{graph::Validated, Graph};

/// Random assignment, optionally seeded for reproducibility.
#[derive(Debug, Clone, Default)]
pub struct Naive {
    seed: Option<u64>,
}

impl Naive {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Uses a fixed seed so repeated runs produce the same assignment.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl Partitioner for Naive {
    fn name(&self) -> &str {
        "naive"
    }

    fn partition(&self, graph: &Graph<Validated>, k: usize) -> Result<Assignment, PartitionError> {
        if k == 0 {
            return Err(PartitionError::InvalidPartitionCount(k));
        }
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(graph
            .nodes()
            .iter()
            .map(|node| (node.clone(), rng.gen_range(0..k)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_graph::TopoLoader;

    fn ring(n: usize) -> Graph<Validated> {
        let nodes: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let mut text = nodes.join(" ");
        text.push('\n');
        for i in 0..n {
            text.push_str(&format!("n{} n{}\n", i, (i + 1) % n));
        }
        TopoLoader::parse(&text).unwrap()
    }

    #[test]
    fn test_every_node_in_range() {
        let g = ring(50);
        let a = Naive::new().partition(&g, 4).unwrap();
        a.validate(&g, 4).unwrap();
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let g = ring(30);
        let a = Naive::with_seed(9).partition(&g, 3).unwrap();
        let b = Naive::with_seed(9).partition(&g, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_partition() {
        let g = ring(5);
        let a = Naive::new().partition(&g, 1).unwrap();
        assert_eq!(a.partitions_used().len(), 1);
    }

    #[test]
    fn test_zero_partitions() {
        let g = ring(5);
        assert!(matches!(
            Naive::new().partition(&g, 0),
            Err(PartitionError::InvalidPartitionCount(0))
        ));
    }
}
