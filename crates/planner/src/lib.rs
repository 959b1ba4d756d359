// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # planner
//!
//! The pipeline that places a virtual network topology onto physical
//! machines and the VMs running on them.
//!
//! The planner takes:
//! - A validated topology `Graph` from `topo-graph`.
//! - A PM strategy and the VM partitioner from `topo-partition`.
//! - Per-PM resources and the gain model from `vm-allocator`.
//!
//! And produces one sub-topology per server, with every cross-server edge
//! replaced by a tunnelled dangling record on both sides, plus the traffic
//! distribution factor (TDF) of the placement.
//!
//! # Type-State Pipeline
//! ```text
//! Planner<Idle> → Loaded → PmPartitioned → Allocated → VmPartitioned → PlanOutput
//! ```
//! Transitions are compile-time checked.
//!
//! # Async Execution
//! Per-PM work (E_max tables and grid search, VM-level partitioning) runs
//! on tokio's blocking pool, at most `num_threads` tasks at a time. Results
//! are keyed by PM id, so completion order does not matter.

mod config;
mod engine;
mod error;
pub mod materialize;
mod metrics;
pub mod tdf;

pub use config::{
    BandwidthConfig, BandwidthPair, MultilevelSettings, PlannerConfig, SolverSettings,
};
pub use engine::{
    Allocated, Idle, Loaded, PlanOutput, Planner, PlannerState, PmAllocation, PmPartitioned,
    VmPartitioned,
};
pub use error::PlannerError;
pub use materialize::{materialize, DanglingEdge, SubTopology, TunnelAllocator, FIRST_TUNNEL_ID};
pub use metrics::{PlanMetrics, Stage};
pub use tdf::{compute_tdf, BandwidthTable, VLINK_LOAD};
