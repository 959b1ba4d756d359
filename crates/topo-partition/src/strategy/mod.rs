// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Partitioner`] trait and strategy implementations.

pub mod external;
pub mod multilevel;
pub mod naive;

use crate::{Assignment, PartitionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use topo_graph::{graph::Validated, Graph};

pub use external::ExternalSolver;
pub use multilevel::Multilevel;
pub use naive::Naive;

/// Trait for partition strategies.
///
/// Each strategy splits a validated topology into `k` parts and returns a
/// fresh node → part mapping covering every node, with parts in `0..k`.
pub trait Partitioner: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Assigns every node of `graph` to one of `k` parts.
    fn partition(&self, graph: &Graph<Validated>, k: usize) -> Result<Assignment, PartitionError>;
}

/// Which PM-level strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Naive,
    Multilevel,
    ExternalSolver,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Naive,
        StrategyKind::Multilevel,
        StrategyKind::ExternalSolver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Naive => "naive",
            StrategyKind::Multilevel => "multilevel",
            StrategyKind::ExternalSolver => "external-solver",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = PartitionError;

    /// Case-insensitive; `metis` and `tbs` are accepted as aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" | "random" => Ok(StrategyKind::Naive),
            "multilevel" | "metis" => Ok(StrategyKind::Multilevel),
            "external-solver" | "external_solver" | "external" | "tbs" => {
                Ok(StrategyKind::ExternalSolver)
            }
            _ => Err(PartitionError::UnknownStrategy(s.to_string())),
        }
    }
}

/// A configured PM-level strategy.
#[derive(Debug, Clone)]
pub enum PmStrategy {
    Naive(Naive),
    Multilevel(Multilevel),
    ExternalSolver(ExternalSolver),
}

impl PmStrategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            PmStrategy::Naive(_) => StrategyKind::Naive,
            PmStrategy::Multilevel(_) => StrategyKind::Multilevel,
            PmStrategy::ExternalSolver(_) => StrategyKind::ExternalSolver,
        }
    }
}

impl Partitioner for PmStrategy {
    fn name(&self) -> &str {
        match self {
            PmStrategy::Naive(s) => s.name(),
            PmStrategy::Multilevel(s) => s.name(),
            PmStrategy::ExternalSolver(s) => s.name(),
        }
    }

    fn partition(&self, graph: &Graph<Validated>, k: usize) -> Result<Assignment, PartitionError> {
        match self {
            PmStrategy::Naive(s) => s.partition(graph, k),
            PmStrategy::Multilevel(s) => s.partition(graph, k),
            PmStrategy::ExternalSolver(s) => s.partition(graph, k),
        }
    }
}

impl From<Naive> for PmStrategy {
    fn from(s: Naive) -> Self {
        PmStrategy::Naive(s)
    }
}

impl From<Multilevel> for PmStrategy {
    fn from(s: Multilevel) -> Self {
        PmStrategy::Multilevel(s)
    }
}

impl From<ExternalSolver> for PmStrategy {
    fn from(s: ExternalSolver) -> Self {
        PmStrategy::ExternalSolver(s)
    }
}
