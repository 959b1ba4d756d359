// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # topo-partition
//!
//! Splits a validated topology across physical machines (PMs), then each
//! PM's share across its virtual machines (VMs), using pluggable
//! strategies.
//!
//! # Strategies
//!
//! | Strategy | Balance | Cut quality | Needs |
//! |---|---|---|---|
//! | [`Naive`] | None (uniform random) | Poor | Nothing |
//! | [`Multilevel`] | METIS default imbalance | Good | The METIS library |
//! | [`ExternalSolver`] | Capacity-bounded | Solver-dependent | A solver binary |
//!
//! VM-level partitioning always uses [`Multilevel`].
//!
//! # Trait-Based Extensibility
//!
//! All strategies implement [`Partitioner`]:
//!
//! ```ignore
//! struct RoundRobin;
//! impl Partitioner for RoundRobin {
//!     fn name(&self) -> &str { "round-robin" }
//!     fn partition(&self, graph: &Graph<Validated>, k: usize)
//!         -> Result<Assignment, PartitionError> { /* ... */ }
//! }
//! ```
//!
//! # Example
//! ```no_run
//! use topo_graph::TopoLoader;
//! use topo_partition::{partition_across_pms, Multilevel};
//! use std::path::Path;
//!
//! let graph = TopoLoader::load(Path::new("./topo/clos_8.txt")).unwrap();
//! let pms = partition_across_pms(&Multilevel::new(), &graph, 4).unwrap();
//! println!("{}", pms.summary());
//! ```

mod arena;
mod assignment;
mod error;
pub mod interchange;
mod pm;
mod retry;
pub mod strategy;
mod vm;

pub use assignment::{Assignment, PartitionId};
pub use error::PartitionError;
pub use pm::{partition_across_pms, PmId, PmPartition};
pub use retry::RetryPolicy;
pub use strategy::{
    ExternalSolver, Multilevel, Naive, Partitioner, PmStrategy, StrategyKind,
};
pub use vm::{partition_across_vms, server_offsets, server_to_pm, total_servers, ServerId};
