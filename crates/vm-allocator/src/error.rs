// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for VM allocation.

use topo_partition::PartitionError;

/// Errors that can occur while choosing a VM allocation for a PM.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    /// A per-VM memory size has no entry in the Theta table.
    #[error("no Theta entry for {memory_gb} GB")]
    MissingTheta { memory_gb: u32 },

    /// A PM or experiment setting is out of range.
    #[error("invalid allocation config: {0}")]
    InvalidConfig(String),

    /// Computing the E_max table failed.
    #[error("E_max partitioning failed: {0}")]
    Partition(#[from] PartitionError),
}
