// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! PM resources and experiment-level allocation settings.

use crate::{AllocError, ThetaTable};
use serde::{Deserialize, Serialize};

/// Resources and cost-model coefficients of one physical machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PmConfig {
    /// Number of CPU cores.
    pub core_count: usize,
    /// Total memory available to VMs, in GB.
    pub memory_gb: u32,
    /// Upper bound on the number of VMs the PM can host.
    pub max_vm_count: usize,
    /// Per-node cost coefficient.
    pub x: f64,
    /// Per-edge-pair cost coefficient.
    pub y: f64,
    /// Per-edge cost coefficient.
    pub z: f64,
    /// Memory size → per-VM overhead.
    pub theta: ThetaTable,
}

impl PmConfig {
    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), AllocError> {
        if self.core_count == 0 {
            return Err(AllocError::InvalidConfig("core_count must be at least 1".into()));
        }
        if self.max_vm_count == 0 {
            return Err(AllocError::InvalidConfig("max_vm_count must be at least 1".into()));
        }
        if self.theta.is_empty() {
            return Err(AllocError::InvalidConfig("Theta table is empty".into()));
        }
        for (name, value) in [("x", self.x), ("y", self.y), ("z", self.z)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AllocError::InvalidConfig(format!(
                    "coefficient {name} = {value} must be finite and non-negative"
                )));
            }
        }
        Ok(())
    }
}

/// Experiment-level allocation settings shared by every PM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Memory the workload needs across all VMs of a PM, in GB.
    pub memory_requirement_gb: f64,
    /// When non-zero, only this VM count may become the optimum.
    pub fixed_vm_count: usize,
    /// When non-zero, only this per-VM memory size may become the optimum.
    pub fixed_memory_gb: u32,
    /// Zero selects the split-network cost model; non-zero the multi-VM
    /// model.
    pub fixed_bbns_count: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            memory_requirement_gb: 32.0,
            fixed_vm_count: 0,
            fixed_memory_gb: 0,
            fixed_bbns_count: 0,
        }
    }
}

impl ExperimentConfig {
    /// Checks the settings on their own.
    pub fn validate(&self) -> Result<(), AllocError> {
        if !self.memory_requirement_gb.is_finite() || self.memory_requirement_gb <= 0.0 {
            return Err(AllocError::InvalidConfig(format!(
                "memory_requirement_gb = {} must be positive",
                self.memory_requirement_gb
            )));
        }
        if self.fixed_memory_gb > 0 && self.fixed_vm_count == 0 {
            return Err(AllocError::InvalidConfig(
                "fixed_memory_gb requires fixed_vm_count".into(),
            ));
        }
        Ok(())
    }

    /// Checks the settings against one PM's Theta table.
    pub fn validate_for(&self, pm: &PmConfig) -> Result<(), AllocError> {
        self.validate()?;
        if self.fixed_memory_gb > 0 && !pm.theta.contains(self.fixed_memory_gb) {
            return Err(AllocError::MissingTheta {
                memory_gb: self.fixed_memory_gb,
            });
        }
        Ok(())
    }
}
