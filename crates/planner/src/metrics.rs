// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Planning run metrics.
//!
//! [`PlanMetrics`] collects per-stage wall-clock time and the size of what
//! each stage produced. These are the numbers to compare PM strategies on.

use serde::Serialize;
use std::time::Duration;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    PmPartition,
    Allocate,
    VmPartition,
    Materialize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::PmPartition => "pm_partition",
            Stage::Allocate => "allocate",
            Stage::VmPartition => "vm_partition",
            Stage::Materialize => "materialize",
        }
    }
}

/// Aggregate metrics for one planning run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanMetrics {
    /// Stage durations in completion order.
    pub stages: Vec<(Stage, Duration)>,
    pub node_count: usize,
    pub edge_count: usize,
    pub pm_count: usize,
    pub cross_pm_edges: usize,
    pub server_count: usize,
    /// Number of tunnels, i.e. edges crossing a server boundary.
    pub tunnel_count: usize,
    pub tdf: f64,
}

impl PlanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stage(&mut self, stage: Stage, elapsed: Duration) {
        self.stages.push((stage, elapsed));
    }

    /// Time spent in `stage`, zero if it never ran.
    pub fn stage_duration(&self, stage: Stage) -> Duration {
        self.stages
            .iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
            .sum()
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|(_, d)| *d).sum()
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let stages: Vec<String> = self
            .stages
            .iter()
            .map(|(s, d)| format!("{} {:.2}ms", s.as_str(), d.as_secs_f64() * 1000.0))
            .collect();
        format!(
            "Plan: {} nodes, {} edges on {} PMs / {} servers, \
             {} cross-PM edges, {} tunnels, TDF {:.4}, {:.2}ms total ({})",
            self.node_count,
            self.edge_count,
            self.pm_count,
            self.server_count,
            self.cross_pm_edges,
            self.tunnel_count,
            self.tdf,
            self.total_duration().as_secs_f64() * 1000.0,
            stages.join(", "),
        )
    }
}
