// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Traffic Distribution Factor.
//!
//! Every edge whose endpoints resolve (node → server → PM) to different
//! PMs puts [`VLINK_LOAD`] on the link between those two PMs. The TDF is
//! the highest `load / bandwidth` ratio over all loaded PM pairs, or 0 when
//! no edge leaves its PM.

use crate::PlannerError;
use std::collections::BTreeMap;
use topo_graph::{graph::Validated, Graph};
use topo_partition::{Assignment, PmId, ServerId};
use tracing::{debug, info};

/// Load one virtual link places on the PM-pair link it crosses.
pub const VLINK_LOAD: f64 = 10.0;

fn pair_key(a: PmId, b: PmId) -> (PmId, PmId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Bandwidth between unordered PM pairs with a fallback default.
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthTable {
    default: f64,
    pairs: BTreeMap<(PmId, PmId), f64>,
}

impl BandwidthTable {
    pub const DEFAULT_BANDWIDTH: f64 = 10_000.0;

    pub fn new(default: f64) -> Self {
        Self {
            default,
            pairs: BTreeMap::new(),
        }
    }

    /// Sets the bandwidth of the link between `a` and `b` (either order).
    pub fn with_pair(mut self, a: PmId, b: PmId, bandwidth: f64) -> Self {
        self.pairs.insert(pair_key(a, b), bandwidth);
        self
    }

    pub fn get(&self, a: PmId, b: PmId) -> f64 {
        self.pairs
            .get(&pair_key(a, b))
            .copied()
            .unwrap_or(self.default)
    }
}

impl Default for BandwidthTable {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BANDWIDTH)
    }
}

/// Accumulated virtual-link load per unordered PM pair.
pub fn pair_loads(
    graph: &Graph<Validated>,
    server_of: &Assignment,
    server_to_pm: &BTreeMap<ServerId, PmId>,
) -> Result<BTreeMap<(PmId, PmId), f64>, PlannerError> {
    let pm_of = |node: &str| -> Result<Option<PmId>, PlannerError> {
        let Some(server) = server_of.get(node) else {
            return Ok(None);
        };
        server_to_pm
            .get(&server)
            .copied()
            .map(Some)
            .ok_or_else(|| PlannerError::UnknownServer {
                node: node.to_string(),
                server,
            })
    };

    let mut loads = BTreeMap::new();
    for (u, v) in graph.edges() {
        let (Some(pu), Some(pv)) = (pm_of(u)?, pm_of(v)?) else {
            continue;
        };
        if pu != pv {
            *loads.entry(pair_key(pu, pv)).or_insert(0.0) += VLINK_LOAD;
        }
    }
    Ok(loads)
}

/// Computes the TDF of a placement.
///
/// A pair with zero bandwidth and non-zero load yields an infinite TDF.
pub fn compute_tdf(
    graph: &Graph<Validated>,
    server_of: &Assignment,
    server_to_pm: &BTreeMap<ServerId, PmId>,
    bandwidth: &BandwidthTable,
) -> Result<f64, PlannerError> {
    let loads = pair_loads(graph, server_of, server_to_pm)?;
    let mut tdf: f64 = 0.0;
    for (&(a, b), &load) in &loads {
        let ratio = load / bandwidth.get(a, b);
        debug!("PM link {a}-{b}: load {load}, relative {ratio}");
        tdf = tdf.max(ratio);
    }
    info!("TDF: {tdf} over {} loaded PM pair(s)", loads.len());
    Ok(tdf)
}
