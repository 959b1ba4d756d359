// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # vm-allocator
//!
//! Chooses, per physical machine, how many VMs to run and how much memory
//! to give each, by maximising a closed-form gain model.
//!
//! # Key Components
//!
//! - [`PmConfig`] / [`ExperimentConfig`] — PM resources, model
//!   coefficients, and the experiment's memory requirement and overrides.
//! - [`ThetaTable`] — per-VM memory size → overhead coefficient.
//! - [`EmaxTable`] — `E_max(n)`, the heaviest per-VM edge load when the PM's
//!   subgraph is split into `n` parts by the multilevel partitioner.
//! - [`grid_search`] / [`optimize`] — the `(n, m)` search producing a
//!   [`SearchResult`]: the trace of admissible points and the chosen
//!   [`VmAllocation`].
//!
//! # Pipeline
//!
//! ```text
//! PM subgraph ──► EmaxTable::compute ──► grid_search ──► SearchResult
//!                   (1 partition per n)     (n × m grid)    ├─ trace (CSV)
//!                                                            ├─ optimum (n, m, vcpu)
//!                                                            └─ is_legal(pm)
//! ```
//!
//! # Example
//! ```no_run
//! use std::collections::BTreeMap;
//! use topo_graph::TopoLoader;
//! use topo_partition::Multilevel;
//! use vm_allocator::{optimize, ExperimentConfig, PmConfig, ThetaTable};
//!
//! let graph = TopoLoader::parse("a b c\na b\nb c\n").unwrap();
//! let pm = PmConfig {
//!     core_count: 8,
//!     memory_gb: 64,
//!     max_vm_count: 4,
//!     x: 0.001,
//!     y: 0.0005,
//!     z: 0.01,
//!     theta: ThetaTable::new(BTreeMap::from([(8, 0.9), (16, 1.4)])).unwrap(),
//! };
//! let (_, result) = optimize(&graph, &pm, &ExperimentConfig::default(), &Multilevel::new()).unwrap();
//! println!("{} legal={}", result.optimum, result.is_legal(&pm));
//! ```

mod config;
pub mod cost;
mod emax;
mod error;
mod search;
mod theta;

pub use config::{ExperimentConfig, PmConfig};
pub use cost::CostModel;
pub use emax::{partition_stats, EmaxTable, PartitionStats};
pub use error::AllocError;
pub use search::{grid_search, optimize, SearchPoint, SearchResult, VmAllocation};
pub use theta::ThetaTable;
