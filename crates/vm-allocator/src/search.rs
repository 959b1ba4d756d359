// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Grid search over (VM count, per-VM memory).
//!
//! `n` runs over `1..core_count` and `m` over the Theta table sizes in
//! ascending order, `n` outermost. A pair is admissible when
//! `m_req <= n·m <= platform memory`; every admissible pair is recorded in
//! the trace. The optimum starts at `(1, 8)` with gain −1 and is replaced
//! only on strict improvement, so ties keep the earliest pair. Fixed VM
//! count / memory settings restrict which pairs may become the optimum but
//! not what is traced.

use crate::cost::{CostFunction, CostModel};
use crate::{AllocError, EmaxTable, ExperimentConfig, PmConfig};
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use topo_graph::{graph::Validated, Graph};
use topo_partition::Multilevel;
use tracing::{debug, info};

const DEFAULT_VM_COUNT: usize = 1;
const DEFAULT_MEMORY_GB: u32 = 8;
const MAX_VCPUS_PER_VM: usize = 8;

/// One admissible grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchPoint {
    /// VM count.
    pub n: usize,
    /// Per-VM memory in GB.
    pub m: u32,
    /// `n · Theta(m)`.
    pub m_extra: f64,
    pub gain: f64,
}

/// The `(count, memory, vcpu)` tuple handed to the VM lifecycle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VmAllocation {
    pub vm_count: usize,
    pub memory_gb: u32,
    pub vcpu_count: usize,
}

impl VmAllocation {
    fn new(vm_count: usize, memory_gb: u32, core_count: usize) -> Self {
        Self {
            vm_count,
            memory_gb,
            vcpu_count: (core_count / vm_count.max(1)).min(MAX_VCPUS_PER_VM),
        }
    }
}

impl fmt::Display for VmAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.vm_count, self.memory_gb, self.vcpu_count)
    }
}

/// Everything the search produced for one PM.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Admissible points in enumeration order.
    pub trace: Vec<SearchPoint>,
    pub optimum: VmAllocation,
    /// Gain of the optimum, or `None` if the default was kept.
    pub optimal_gain: Option<f64>,
}

impl SearchResult {
    /// `false` when the optimum needs more VMs than the PM can host.
    pub fn is_legal(&self, pm: &PmConfig) -> bool {
        self.optimum.vm_count <= pm.max_vm_count
    }

    /// Renders the trace as CSV, best gain first, with `m_extra` and
    /// `Gain` rounded to two decimals.
    pub fn to_csv(&self) -> String {
        let mut rows = self.trace.clone();
        rows.sort_by(|a, b| b.gain.total_cmp(&a.gain));
        let mut out = String::from("n,m,m_extra,Gain\n");
        for p in rows {
            let _ = writeln!(out, "{},{},{:.2},{:.2}", p.n, p.m, p.m_extra, p.gain);
        }
        out
    }
}

/// Picks the best `(n, m)` for a PM from a precomputed E_max table.
pub fn grid_search(
    emax: &EmaxTable,
    node_count: usize,
    pm: &PmConfig,
    experiment: &ExperimentConfig,
) -> Result<SearchResult, AllocError> {
    experiment.validate_for(pm)?;

    let cost = CostFunction {
        model: CostModel::for_bbns_count(experiment.fixed_bbns_count),
        node_count,
        emax,
        x: pm.x,
        y: pm.y,
        z: pm.z,
    };
    let m_req = experiment.memory_requirement_gb;
    let platform = f64::from(pm.memory_gb);

    let mut trace = Vec::new();
    let mut best: Option<(usize, u32, f64)> = None;
    let mut max_gain = -1.0;

    for n in 1..pm.core_count {
        for (m, theta_m) in pm.theta.iter() {
            let total = n as f64 * f64::from(m);
            if total < m_req || total > platform {
                continue;
            }
            let gain = cost.gain(n, theta_m, m_req);
            trace.push(SearchPoint {
                n,
                m,
                m_extra: n as f64 * theta_m,
                gain,
            });

            if experiment.fixed_vm_count > 0 && n != experiment.fixed_vm_count {
                continue;
            }
            if experiment.fixed_memory_gb > 0 && m != experiment.fixed_memory_gb {
                continue;
            }
            if gain > max_gain {
                max_gain = gain;
                best = Some((n, m, gain));
            }
        }
    }

    let (n_opt, m_opt, optimal_gain) = match best {
        Some((n, m, g)) => (n, m, Some(g)),
        None => {
            debug!("no admissible (n, m) pair; keeping the default allocation");
            (DEFAULT_VM_COUNT, DEFAULT_MEMORY_GB, None)
        }
    };

    Ok(SearchResult {
        trace,
        optimum: VmAllocation::new(n_opt, m_opt, pm.core_count),
        optimal_gain,
    })
}

/// Computes the E_max table for `pm_graph` and runs the grid search.
pub fn optimize(
    pm_graph: &Graph<Validated>,
    pm: &PmConfig,
    experiment: &ExperimentConfig,
    partitioner: &Multilevel,
) -> Result<(EmaxTable, SearchResult), AllocError> {
    pm.validate()?;
    experiment.validate_for(pm)?;

    let emax = EmaxTable::compute(pm_graph, pm.core_count, partitioner)?;
    let result = grid_search(&emax, pm_graph.node_count(), pm, experiment)?;
    info!(
        "optimum {} over {} admissible point(s)",
        result.optimum,
        result.trace.len()
    );
    Ok((emax, result))
}
