// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Balanced k-way partitioning that minimises cut edges, backed by METIS.
//!
//! Node ids are mapped to dense indices through an index arena, handed to
//! METIS as `xadj/adjncy` arrays, and mapped back. The same partitioner is
//! used at PM level, at VM level and for the E_max estimate.
//!
//! # Seeding
//! - **Deterministic** (default): direct k-way with a fixed seed, so
//!   `E_max` estimates and tests are reproducible.
//! - **Randomized**: recursive bisection with 20 refinement iterations and
//!   a fresh seed per call, for callers that want variety across runs.
//!
//! METIS rejecting its input ([`metis::Error::Input`]) is retried with a
//! fresh seed, up to the configured [`RetryPolicy`]. Any other METIS
//! failure is reported as [`PartitionError::Solver`].

use crate::arena::{Csr, IndexArena};
use crate::strategy::Partitioner;
use crate::{Assignment, PartitionError, PartitionId, RetryPolicy};
use topo_graph::{graph::Validated, Graph};
use tracing::{debug, warn};

/// Refinement iterations used in randomized mode.
const RANDOMIZED_ITERATIONS: metis::Idx = 20;

/// The METIS entry point used for a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `METIS_PartGraphKway`.
    KWay,
    /// `METIS_PartGraphRecursive`.
    RecursiveBisection,
}

/// Multilevel k-way partitioner.
#[derive(Debug, Clone)]
pub struct Multilevel {
    method: Method,
    seed: Option<u64>,
    iterations: Option<metis::Idx>,
    retry: RetryPolicy,
}

impl Default for Multilevel {
    fn default() -> Self {
        Self::new()
    }
}

impl Multilevel {
    /// Deterministic k-way partitioner with seed 0.
    pub fn new() -> Self {
        Self {
            method: Method::KWay,
            seed: Some(0),
            iterations: None,
            retry: RetryPolicy::MULTILEVEL_DEFAULT,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Draws a fresh seed on every call and switches to recursive
    /// bisection with extra refinement.
    pub fn randomized(mut self) -> Self {
        self.seed = None;
        self.method = Method::RecursiveBisection;
        self.iterations = Some(RANDOMIZED_ITERATIONS);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn is_deterministic(&self) -> bool {
        self.seed.is_some()
    }

    /// One METIS call.
    fn run_metis(
        &self,
        csr: &mut Csr,
        k: usize,
        seed: u64,
    ) -> Result<Vec<PartitionId>, metis::Error> {
        let mut part = vec![0; csr.node_count()];
        let mut graph = metis::Graph::new(1, k as metis::Idx, &mut csr.xadj, &mut csr.adjncy)
            .set_option(metis::option::Seed(metis_seed(seed)));
        if let Some(iterations) = self.iterations {
            graph = graph.set_option(metis::option::NIter(iterations));
        }
        match self.method {
            Method::KWay => graph.part_kway(&mut part)?,
            Method::RecursiveBisection => graph.part_recursive(&mut part)?,
        };
        Ok(part.into_iter().map(|p| p as PartitionId).collect())
    }

    /// Calls `attempt` until it succeeds, redrawing the seed after every
    /// rejected input.
    fn with_retries<F>(&self, mut attempt: F) -> Result<Vec<PartitionId>, PartitionError>
    where
        F: FnMut(u64) -> Result<Vec<PartitionId>, metis::Error>,
    {
        let mut seed = self.seed.unwrap_or_else(rand::random);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt(seed) {
                Ok(parts) => {
                    debug!("METIS succeeded with seed {seed} on attempt {attempts}");
                    return Ok(parts);
                }
                Err(metis::Error::Input) if self.retry.allows_another(attempts) => {
                    warn!("METIS rejected its input on attempt {attempts}; retrying with a new seed");
                    seed = rand::random();
                }
                Err(metis::Error::Input) => {
                    return Err(PartitionError::RetriesExhausted {
                        attempts,
                        last: metis::Error::Input,
                    })
                }
                Err(err) => return Err(PartitionError::Solver(format!("METIS: {err}"))),
            }
        }
    }
}

impl Partitioner for Multilevel {
    fn name(&self) -> &str {
        "multilevel"
    }

    fn partition(&self, graph: &Graph<Validated>, k: usize) -> Result<Assignment, PartitionError> {
        if k == 0 {
            return Err(PartitionError::InvalidPartitionCount(k));
        }
        if k == 1 {
            return Ok(Assignment::uniform(graph, 0));
        }

        let arena = IndexArena::build(graph);
        let mut csr = arena.csr(graph);
        let n = csr.node_count();

        // Trivial splits METIS has nothing to optimise on.
        if n <= k || csr.edge_count() == 0 {
            let parts: Vec<PartitionId> = (0..n).map(|i| i % k).collect();
            return Ok(arena.assignment(&parts));
        }

        let parts = self.with_retries(|seed| self.run_metis(&mut csr, k, seed))?;
        debug!("multilevel: {n} nodes into {k} parts");
        Ok(arena.assignment(&parts))
    }
}

/// METIS seeds are C ints.
fn metis_seed(seed: u64) -> metis::Idx {
    (seed % metis::Idx::MAX as u64) as metis::Idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use topo_graph::TopoLoader;

    fn grid(rows: usize, cols: usize) -> Graph<Validated> {
        let name = |r: usize, c: usize| format!("g{r}_{c}");
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                nodes.push(name(r, c));
                if c + 1 < cols {
                    edges.push(format!("{} {}", name(r, c), name(r, c + 1)));
                }
                if r + 1 < rows {
                    edges.push(format!("{} {}", name(r, c), name(r + 1, c)));
                }
            }
        }
        TopoLoader::parse(&format!("{}\n{}\n", nodes.join(" "), edges.join("\n"))).unwrap()
    }

    fn cut(graph: &Graph<Validated>, a: &Assignment) -> usize {
        graph.edges().filter(|(u, v)| a.get(u) != a.get(v)).count()
    }

    #[test]
    fn test_covers_every_node() {
        let g = grid(8, 8);
        let a = Multilevel::new().partition(&g, 4).unwrap();
        a.validate(&g, 4).unwrap();
        assert_eq!(a.partitions_used().len(), 4);
    }

    #[test]
    fn test_beats_random_cut() {
        let g = grid(12, 12);
        let a = Multilevel::new().partition(&g, 2).unwrap();
        // A random 2-way split cuts about half of the 264 edges.
        assert!(cut(&g, &a) < 40, "cut {}", cut(&g, &a));
    }

    #[test]
    fn test_deterministic_by_default() {
        let g = grid(10, 10);
        let ml = Multilevel::new();
        assert!(ml.is_deterministic());
        assert_eq!(ml.partition(&g, 3).unwrap(), ml.partition(&g, 3).unwrap());
    }

    #[test]
    fn test_randomized_still_valid() {
        let g = grid(6, 6);
        let ml = Multilevel::new().randomized();
        assert!(!ml.is_deterministic());
        ml.partition(&g, 2).unwrap().validate(&g, 2).unwrap();
    }

    #[test]
    fn test_single_part_short_circuit() {
        let g = grid(3, 3);
        let a = Multilevel::new().partition(&g, 1).unwrap();
        assert!(a.iter().all(|(_, p)| p == 0));
    }

    #[test]
    fn test_recursive_bisection_valid() {
        let g = grid(8, 8);
        let ml = Multilevel::new().with_method(Method::RecursiveBisection);
        ml.partition(&g, 4).unwrap().validate(&g, 4).unwrap();
    }

    #[test]
    fn test_more_parts_than_nodes() {
        let g = TopoLoader::parse("a b c\na b\nb c\n").unwrap();
        let a = Multilevel::new().partition(&g, 5).unwrap();
        a.validate(&g, 5).unwrap();
        assert_eq!(a.partitions_used().len(), 3);
    }

    #[test]
    fn test_rejected_input_retried_with_new_seed() {
        let ml = Multilevel::new().with_seed(7);
        let mut seeds = Vec::new();
        let parts = ml
            .with_retries(|seed| {
                seeds.push(seed);
                if seeds.len() == 1 {
                    Err(metis::Error::Input)
                } else {
                    Ok(vec![0, 1])
                }
            })
            .unwrap();
        assert_eq!(parts, vec![0, 1]);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0], 7);
    }

    #[test]
    fn test_retries_exhausted() {
        let ml = Multilevel::new().with_retry(RetryPolicy::Bounded(3));
        let mut calls = 0;
        let err = ml
            .with_retries(|_| {
                calls += 1;
                Err(metis::Error::Input)
            })
            .unwrap_err();
        assert!(matches!(err, PartitionError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_other_failures_not_retried() {
        let ml = Multilevel::new();
        let mut calls = 0;
        let err = ml
            .with_retries(|_| {
                calls += 1;
                Err(metis::Error::Memory)
            })
            .unwrap_err();
        assert!(matches!(err, PartitionError::Solver(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_randomized_uses_recursive_bisection() {
        let ml = Multilevel::new().randomized();
        assert_eq!(ml.method(), Method::RecursiveBisection);
        assert_eq!(Multilevel::new().method(), Method::KWay);
    }

    #[test]
    fn test_metis_seed_fits_c_int() {
        assert_eq!(metis_seed(5), 5);
        assert!(metis_seed(u64::MAX) >= 0);
    }

    #[test]
    fn test_empty_graph() {
        let a = Multilevel::new().partition(&Graph::empty(), 3).unwrap();
        assert!(a.is_empty());
    }
}
