// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for PM and VM partitioning.

use std::time::Duration;

/// Errors that can occur while partitioning a topology.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// The topology has no nodes.
    #[error("cannot partition an empty topology")]
    EmptyGraph,

    /// A partition count of zero was requested.
    #[error("invalid partition count {0}: at least one partition is required")]
    InvalidPartitionCount(usize),

    /// METIS kept rejecting its input.
    #[error("multilevel partitioning failed after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: metis::Error,
    },

    /// The external solver failed, or produced unusable output.
    #[error("external solver: {0}")]
    Solver(String),

    /// The external solver did not succeed before the configured deadline.
    #[error("external solver gave up after {attempts} attempt(s) in {elapsed:?}")]
    DeadlineExceeded { attempts: u32, elapsed: Duration },

    /// A strategy name did not match any known strategy.
    #[error("unknown partitioning strategy '{0}' (expected naive, multilevel or external-solver)")]
    UnknownStrategy(String),

    /// A node → partition mapping does not cover the graph or names an
    /// out-of-range partition.
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    /// Reading or writing solver files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
