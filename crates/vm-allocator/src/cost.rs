// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Closed-form runtime cost and gain models.
//!
//! With `E = E_max(n)`, `V` nodes on the PM and coefficients `X, Y, Z`:
//!
//! ```text
//! T_mvs(n) = E·(V/n·X + Z) + E²·Y/2
//! T_sn(n)  = E·(V/n·X + Z) + E·sqrt(2·E·X·Y)
//!
//! Gain(n, m) = ((T(1) − T(n)) / T(1)) / ((n·Theta(m)) / m_req)
//! ```

use crate::EmaxTable;
use serde::{Deserialize, Serialize};

/// Which runtime model drives the gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CostModel {
    /// `T_sn`: used when no fixed BBNS count is configured.
    SplitNetwork,
    /// `T_mvs`: used with a fixed BBNS count.
    MultiVm,
}

impl CostModel {
    pub fn for_bbns_count(fixed_bbns_count: usize) -> Self {
        if fixed_bbns_count == 0 {
            CostModel::SplitNetwork
        } else {
            CostModel::MultiVm
        }
    }
}

/// A cost model bound to one PM's topology and coefficients.
#[derive(Debug, Clone)]
pub struct CostFunction<'a> {
    pub model: CostModel,
    pub node_count: usize,
    pub emax: &'a EmaxTable,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CostFunction<'_> {
    /// Modelled runtime with `n` VMs.
    pub fn runtime(&self, n: usize) -> f64 {
        let e = self.emax.get(n) as f64;
        let v = self.node_count as f64;
        let base = e * (v / n as f64 * self.x + self.z);
        match self.model {
            CostModel::MultiVm => base + e * e * self.y / 2.0,
            CostModel::SplitNetwork => base + e * (2.0 * e * self.x * self.y).sqrt(),
        }
    }

    /// Relative runtime improvement per unit of extra memory.
    ///
    /// Returns 0 when the single-VM runtime is 0, since no improvement is
    /// possible.
    pub fn gain(&self, n: usize, theta_m: f64, memory_requirement_gb: f64) -> f64 {
        let t1 = self.runtime(1);
        if t1 == 0.0 {
            return 0.0;
        }
        let improvement = (t1 - self.runtime(n)) / t1;
        let memory_ratio = n as f64 * theta_m / memory_requirement_gb;
        improvement / memory_ratio
    }
}
