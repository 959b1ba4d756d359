// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Capacity-constrained partitioning by an external solver program.
//!
//! The graph is written in [interchange format](crate::interchange), then
//! the solver is invoked as
//!
//! ```text
//! <program> <graph file> --k=<k> --cpu_capacity=<cap> --preconfiguration=<preset>
//! ```
//!
//! from the configured working directory, with
//! `cap = ⌊factor × nodes / k⌋`. A run succeeds when it exits with status 0
//! and none of the error markers appears in its stderr. Failed runs are
//! retried with the next factor from [`CapacitySchedule`]. On success the
//! solver has written one partition id per line to its output file, line
//! `i` belonging to interchange node `i`.

use crate::arena::IndexArena;
use crate::strategy::Partitioner;
use crate::{interchange, Assignment, PartitionError, RetryPolicy};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use topo_graph::{graph::Validated, Graph};
use tracing::{info, warn};

/// Capacity factors tried in order: tight factors interleaved with an
/// open-ended relaxation, starting tight.
///
/// ```text
/// 1.05, 1.10, 1.04, 1.15, 1.03, 1.20, 1.02, 1.25, 1.01, 1.30, 1.35, ...
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapacitySchedule {
    tight: usize,
    relaxed: usize,
    last_was_tight: bool,
}

impl CapacitySchedule {
    const TIGHT: [f64; 5] = [1.05, 1.04, 1.03, 1.02, 1.01];

    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for CapacitySchedule {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if !self.last_was_tight && self.tight < Self::TIGHT.len() {
            let factor = Self::TIGHT[self.tight];
            self.tight += 1;
            self.last_was_tight = true;
            return Some(factor);
        }
        // Computed from the step count so the factors do not drift.
        let factor = 1.10 + 0.05 * self.relaxed as f64;
        self.relaxed += 1;
        self.last_was_tight = false;
        Some(factor)
    }
}

/// Per-partition node capacity passed to the solver.
pub fn cpu_capacity(factor: f64, node_count: usize, k: usize) -> usize {
    (factor * node_count as f64 / k as f64).floor() as usize
}

/// Partitioner backed by an external solver binary.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    program: PathBuf,
    working_dir: PathBuf,
    graph_path: PathBuf,
    output_path: Option<PathBuf>,
    preconfiguration: String,
    error_markers: Vec<String>,
    retry: RetryPolicy,
    deadline: Option<Duration>,
}

enum RunOutcome {
    Success,
    Failed(String),
}

impl ExternalSolver {
    /// Solver `program` run from `working_dir`, writing its interchange
    /// graph to `<working_dir>/topology.graph`.
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self {
            program: program.into(),
            graph_path: working_dir.join("topology.graph"),
            working_dir,
            output_path: None,
            preconfiguration: "esocial".to_string(),
            error_markers: vec!["Traceback".to_string()],
            retry: RetryPolicy::SOLVER_DEFAULT,
            deadline: None,
        }
    }

    pub fn graph_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph_path = path.into();
        self
    }

    /// Overrides the solver's output file; defaults to
    /// `<working_dir>/tmppartition<k>`.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn preconfiguration(mut self, preset: impl Into<String>) -> Self {
        self.preconfiguration = preset.into();
        self
    }

    pub fn error_markers(mut self, markers: Vec<String>) -> Self {
        self.error_markers = markers;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn resolved_output(&self, k: usize) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.working_dir.join(format!("tmppartition{k}")))
    }

    fn run_once(&self, k: usize, capacity: usize) -> Result<RunOutcome, PartitionError> {
        let output = Command::new(&self.program)
            .arg(&self.graph_path)
            .arg(format!("--k={k}"))
            .arg(format!("--cpu_capacity={capacity}"))
            .arg(format!("--preconfiguration={}", self.preconfiguration))
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                PartitionError::Solver(format!(
                    "cannot launch '{}': {e}",
                    self.program.display()
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if let Some(marker) = self.error_markers.iter().find(|m| stderr.contains(m.as_str())) {
            return Ok(RunOutcome::Failed(format!("stderr contains '{marker}'")));
        }
        if !output.status.success() {
            return Ok(RunOutcome::Failed(format!("exited with {}", output.status)));
        }
        Ok(RunOutcome::Success)
    }
}

impl Partitioner for ExternalSolver {
    fn name(&self) -> &str {
        "external-solver"
    }

    fn partition(&self, graph: &Graph<Validated>, k: usize) -> Result<Assignment, PartitionError> {
        if k == 0 {
            return Err(PartitionError::InvalidPartitionCount(k));
        }
        if k == 1 {
            return Ok(Assignment::uniform(graph, 0));
        }

        let arena = IndexArena::build(graph);
        interchange::write_with(&arena, graph, &self.graph_path)?;

        let started = Instant::now();
        let mut attempts = 0u32;
        for factor in CapacitySchedule::new() {
            if let Some(deadline) = self.deadline {
                let elapsed = started.elapsed();
                if elapsed >= deadline {
                    return Err(PartitionError::DeadlineExceeded { attempts, elapsed });
                }
            }
            if !self.retry.allows_another(attempts) {
                return Err(PartitionError::Solver(format!(
                    "no successful run after {attempts} attempt(s)"
                )));
            }
            attempts += 1;

            let capacity = cpu_capacity(factor, graph.node_count(), k);
            info!("external solver attempt {attempts}: k={k}, capacity factor {factor:.2} (cap {capacity})");
            match self.run_once(k, capacity)? {
                RunOutcome::Success => break,
                RunOutcome::Failed(reason) => {
                    warn!("external solver failed at factor {factor:.2}: {reason}")
                }
            }
        }

        read_solution(&self.resolved_output(k), &arena, k)
    }
}

/// Parses the solver's output: line `i` holds the partition of interchange
/// node `i + 1`.
fn read_solution(
    path: &Path,
    arena: &IndexArena<'_>,
    k: usize,
) -> Result<Assignment, PartitionError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PartitionError::Solver(format!("cannot read output '{}': {e}", path.display()))
    })?;

    let mut parts = Vec::with_capacity(arena.len());
    for (i, line) in text.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
        let part: usize = line.parse().map_err(|_| {
            PartitionError::Solver(format!("line {}: '{line}' is not a partition id", i + 1))
        })?;
        if part >= k {
            return Err(PartitionError::Solver(format!(
                "node {} assigned to partition {part}, but only {k} PMs exist",
                i + 1
            )));
        }
        parts.push(part);
    }
    if parts.len() != arena.len() {
        return Err(PartitionError::Solver(format!(
            "output has {} entries for {} nodes",
            parts.len(),
            arena.len()
        )));
    }
    Ok(arena.assignment(&parts))
}
