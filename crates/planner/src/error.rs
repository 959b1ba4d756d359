// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the planning pipeline.

use topo_partition::ServerId;

/// Errors that can occur while planning a placement.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The topology could not be loaded.
    #[error("topology error: {0}")]
    Topology(#[from] topo_graph::TopoError),

    /// PM- or VM-level partitioning failed.
    #[error("partition error: {0}")]
    Partition(#[from] topo_partition::PartitionError),

    /// The resource allocation optimizer rejected its inputs.
    #[error("allocation error: {0}")]
    Allocation(#[from] vm_allocator::AllocError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A node was mapped to a server that no PM owns.
    #[error("server {server} (hosting '{node}') is not owned by any PM")]
    UnknownServer { node: String, server: ServerId },

    /// A sub-topology file is malformed.
    #[error("sub-topology line {line}: {detail}")]
    SubTopology { line: usize, detail: String },

    /// Reading or writing plan files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking per-PM task panicked or was cancelled.
    #[error("planning task failed: {0}")]
    TaskFailed(String),
}
