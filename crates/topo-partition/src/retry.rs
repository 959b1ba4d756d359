// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Retry bounds for partitioners that can fail transiently.

use serde::{Deserialize, Serialize};

/// How many attempts a partitioner may make before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// At most this many attempts in total.
    Bounded(u32),
    /// Keep trying until success.
    Unbounded,
}

impl RetryPolicy {
    /// Default attempt bound for the multilevel partitioner.
    pub const MULTILEVEL_DEFAULT: RetryPolicy = RetryPolicy::Bounded(16);
    /// Default attempt bound for the external solver.
    pub const SOLVER_DEFAULT: RetryPolicy = RetryPolicy::Bounded(32);

    /// Returns `true` if another attempt may follow `attempts_made`.
    pub fn allows_another(&self, attempts_made: u32) -> bool {
        match self {
            RetryPolicy::Bounded(max) => attempts_made < *max,
            RetryPolicy::Unbounded => true,
        }
    }

    /// Builds a policy from an optional attempt bound and an explicit
    /// opt-in to unbounded retries.
    pub fn from_settings(max_attempts: u32, unbounded: bool) -> Self {
        if unbounded {
            RetryPolicy::Unbounded
        } else {
            RetryPolicy::Bounded(max_attempts.max(1))
        }
    }
}
