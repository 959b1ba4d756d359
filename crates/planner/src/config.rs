// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Planner configuration loaded from TOML or JSON files or constructed
//! programmatically.
//!
//! # TOML Format
//! ```toml
//! topology = "./topo/grid_10_10.txt"
//! output_dir = "./out"
//! strategy = "multilevel"
//! num_threads = 4
//!
//! [experiment]
//! memory_requirement_gb = 32.0
//!
//! [multilevel]
//! seed = 0
//! max_attempts = 16
//!
//! [solver]
//! program = "/opt/tbs/build/tbs"
//! working_dir = "/opt/tbs/build"
//! deadline_secs = 600
//!
//! [bandwidth]
//! default = 10000.0
//! pairs = [{ a = 0, b = 1, bandwidth = 5000.0 }]
//!
//! [[pms]]
//! core_count = 32
//! memory_gb = 256
//! max_vm_count = 8
//! x = 0.001
//! y = 0.0005
//! z = 0.01
//! theta = { "8" = 0.9, "16" = 1.4 }
//! ```

use crate::tdf::BandwidthTable;
use crate::PlannerError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use topo_partition::{
    ExternalSolver, Multilevel, Naive, PmId, PmStrategy, RetryPolicy, StrategyKind,
};
use vm_allocator::{ExperimentConfig, PmConfig};

/// Seed and retry settings for the multilevel partitioner.
///
/// The same settings drive PM-level partitioning (when selected), VM-level
/// partitioning and the E_max tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultilevelSettings {
    /// Fixed seed; `None` draws a fresh seed on every call.
    pub seed: Option<u64>,
    pub max_attempts: u32,
    /// Retry rejected inputs forever. Ignores `max_attempts`.
    pub unbounded: bool,
}

impl Default for MultilevelSettings {
    fn default() -> Self {
        Self {
            seed: Some(0),
            max_attempts: 16,
            unbounded: false,
        }
    }
}

impl MultilevelSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_settings(self.max_attempts, self.unbounded)
    }

    /// Builds the partitioner these settings describe.
    pub fn partitioner(&self) -> Multilevel {
        let base = Multilevel::new().with_retry(self.retry_policy());
        match self.seed {
            Some(seed) => base.with_seed(seed),
            None => base.randomized(),
        }
    }

    /// Like [`partitioner`](Self::partitioner) but always seeded; used for
    /// the E_max tables so the cost model sees reproducible splits.
    pub fn deterministic(&self) -> Multilevel {
        Multilevel::new()
            .with_retry(self.retry_policy())
            .with_seed(self.seed.unwrap_or(0))
    }
}

/// How to invoke the external balanced partitioning program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    pub program: PathBuf,
    pub working_dir: PathBuf,
    #[serde(default = "default_preconfiguration")]
    pub preconfiguration: String,
    /// Substrings of the solver's stderr that mark a failed run.
    #[serde(default = "default_error_markers")]
    pub error_markers: Vec<String>,
    #[serde(default = "default_solver_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub unbounded: bool,
    /// Wall-clock limit across all attempts.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

fn default_preconfiguration() -> String {
    "esocial".to_string()
}

fn default_error_markers() -> Vec<String> {
    vec!["Traceback".to_string()]
}

fn default_solver_attempts() -> u32 {
    32
}

impl SolverSettings {
    /// Builds the solver; its interchange graph is written next to the
    /// topology, with a `.graph` extension.
    pub fn solver(&self, topology: &Path) -> ExternalSolver {
        let solver = ExternalSolver::new(&self.program, &self.working_dir)
            .graph_path(topology.with_extension("graph"))
            .preconfiguration(self.preconfiguration.clone())
            .error_markers(self.error_markers.clone())
            .retry(RetryPolicy::from_settings(self.max_attempts, self.unbounded));
        match self.deadline_secs {
            Some(secs) => solver.deadline(Duration::from_secs(secs)),
            None => solver,
        }
    }
}

/// Explicit bandwidth for one unordered PM pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthPair {
    pub a: PmId,
    pub b: PmId,
    pub bandwidth: f64,
}

/// Cross-machine bandwidth settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandwidthConfig {
    /// Used for every PM pair without an explicit entry.
    pub default: f64,
    pub pairs: Vec<BandwidthPair>,
}

impl Default for BandwidthConfig {
    fn default() -> Self {
        Self {
            default: BandwidthTable::DEFAULT_BANDWIDTH,
            pairs: Vec::new(),
        }
    }
}

impl BandwidthConfig {
    pub fn table(&self) -> BandwidthTable {
        self.pairs.iter().fold(BandwidthTable::new(self.default), |t, p| {
            t.with_pair(p.a, p.b, p.bandwidth)
        })
    }
}

/// Configuration for a planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Path to the topology file.
    pub topology: PathBuf,
    /// Directory receiving sub-topologies, the TDF and search traces.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// PM strategy name: `"naive"`, `"multilevel"` or `"external-solver"`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Number of concurrent per-PM tasks (defaults to available parallelism).
    #[serde(default)]
    pub num_threads: Option<usize>,
    #[serde(default)]
    pub experiment: ExperimentConfig,
    #[serde(default)]
    pub multilevel: MultilevelSettings,
    /// Required only by the external-solver strategy.
    #[serde(default)]
    pub solver: Option<SolverSettings>,
    #[serde(default)]
    pub bandwidth: BandwidthConfig,
    /// One entry per physical machine; the index is the PM id.
    #[serde(default)]
    pub pms: Vec<PmConfig>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./out")
}

fn default_strategy() -> String {
    StrategyKind::Multilevel.as_str().to_string()
}

impl PlannerConfig {
    /// Loads configuration from a file; `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, PlannerError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlannerError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PlannerError> {
        toml::from_str(toml_str)
            .map_err(|e| PlannerError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Parses configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PlannerError> {
        serde_json::from_str(json)
            .map_err(|e| PlannerError::ConfigError(format!("JSON parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, PlannerError> {
        toml::to_string_pretty(self)
            .map_err(|e| PlannerError::ConfigError(format!("TOML serialise error: {e}")))
    }

    pub fn pm_count(&self) -> usize {
        self.pms.len()
    }

    /// Checks the whole configuration before any work starts.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.pms.is_empty() {
            return Err(PlannerError::ConfigError(
                "at least one [[pms]] entry is required".into(),
            ));
        }
        for (pm, cfg) in self.pms.iter().enumerate() {
            cfg.validate().map_err(|e| {
                PlannerError::ConfigError(format!("PM {pm}: {e}"))
            })?;
            self.experiment.validate_for(cfg)?;
        }
        if self.num_threads == Some(0) {
            return Err(PlannerError::ConfigError("num_threads must be at least 1".into()));
        }
        let bandwidths = std::iter::once(self.bandwidth.default)
            .chain(self.bandwidth.pairs.iter().map(|p| p.bandwidth));
        for bw in bandwidths {
            if !bw.is_finite() || bw < 0.0 {
                return Err(PlannerError::ConfigError(format!(
                    "bandwidth {bw} must be finite and non-negative"
                )));
            }
        }
        if self.strategy_kind()? == StrategyKind::ExternalSolver && self.solver.is_none() {
            return Err(PlannerError::ConfigError(
                "strategy 'external-solver' requires a [solver] section".into(),
            ));
        }
        Ok(())
    }

    /// Resolves the number of concurrent per-PM tasks.
    pub fn resolve_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    /// Parses the strategy name.
    pub fn strategy_kind(&self) -> Result<StrategyKind, PlannerError> {
        self.strategy
            .parse()
            .map_err(|e: topo_partition::PartitionError| PlannerError::ConfigError(e.to_string()))
    }

    /// Creates the PM strategy specified by this config.
    pub fn create_strategy(&self) -> Result<PmStrategy, PlannerError> {
        match self.strategy_kind()? {
            StrategyKind::Naive => Ok(Naive::new().into()),
            // PM-level splits redraw the seed on every retry.
            StrategyKind::Multilevel => Ok(self.multilevel.partitioner().into()),
            StrategyKind::ExternalSolver => {
                let settings = self.solver.as_ref().ok_or_else(|| {
                    PlannerError::ConfigError(
                        "strategy 'external-solver' requires a [solver] section".into(),
                    )
                })?;
                Ok(settings.solver(&self.topology).into())
            }
        }
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            topology: PathBuf::from("./topo/topology.txt"),
            output_dir: default_output_dir(),
            strategy: default_strategy(),
            num_threads: None,
            experiment: ExperimentConfig::default(),
            multilevel: MultilevelSettings::default(),
            solver: None,
            bandwidth: BandwidthConfig::default(),
            pms: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use topo_partition::Partitioner;
    use vm_allocator::ThetaTable;

    fn sample_pm() -> PmConfig {
        PmConfig {
            core_count: 8,
            memory_gb: 64,
            max_vm_count: 4,
            x: 0.001,
            y: 0.0005,
            z: 0.01,
            theta: ThetaTable::new(BTreeMap::from([(8, 0.9), (16, 1.4)])).unwrap(),
        }
    }

    fn sample() -> PlannerConfig {
        PlannerConfig {
            pms: vec![sample_pm(), sample_pm()],
            ..Default::default()
        }
    }

    const TOML: &str = r#"
topology = "/tmp/topo.txt"
output_dir = "/tmp/out"
strategy = "naive"
num_threads = 2

[experiment]
memory_requirement_gb = 16.0
fixed_vm_count = 2

[multilevel]
seed = 7

[bandwidth]
default = 100.0
pairs = [{ a = 0, b = 1, bandwidth = 25.0 }]

[[pms]]
core_count = 8
memory_gb = 64
max_vm_count = 4
x = 0.001
y = 0.0005
z = 0.01
theta = { "8" = 0.9, "16" = 1.4 }
"#;

    #[test]
    fn test_default() {
        let c = PlannerConfig::default();
        assert_eq!(c.strategy, "multilevel");
        assert_eq!(c.multilevel.seed, Some(0));
        assert_eq!(c.bandwidth.default, 10_000.0);
        assert!(c.pms.is_empty());
    }

    #[test]
    fn test_from_toml() {
        let c = PlannerConfig::from_toml(TOML).unwrap();
        assert_eq!(c.topology, PathBuf::from("/tmp/topo.txt"));
        assert_eq!(c.num_threads, Some(2));
        assert_eq!(c.experiment.memory_requirement_gb, 16.0);
        assert_eq!(c.experiment.fixed_vm_count, 2);
        assert_eq!(c.multilevel.seed, Some(7));
        assert_eq!(c.multilevel.max_attempts, 16);
        assert_eq!(c.pm_count(), 1);
        assert_eq!(c.pms[0].theta.get(16).unwrap(), 1.4);
        assert_eq!(c.bandwidth.table().get(1, 0), 25.0);
        c.validate().unwrap();
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "topology": "t.txt",
            "pms": [{"core_count": 4, "memory_gb": 32, "max_vm_count": 2,
                     "x": 0.1, "y": 0.1, "z": 0.1, "theta": {"8": 1.0}}]
        }"#;
        let c = PlannerConfig::from_json(json).unwrap();
        assert_eq!(c.strategy, "multilevel");
        assert_eq!(c.output_dir, PathBuf::from("./out"));
        assert_eq!(c.pms[0].core_count, 4);
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("plan.toml");
        std::fs::write(&toml_path, TOML).unwrap();
        assert_eq!(PlannerConfig::from_file(&toml_path).unwrap().strategy, "naive");

        let json_path = dir.path().join("plan.json");
        std::fs::write(&json_path, serde_json::to_string(&sample()).unwrap()).unwrap();
        assert_eq!(PlannerConfig::from_file(&json_path).unwrap().pm_count(), 2);

        assert!(PlannerConfig::from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = sample();
        let back = PlannerConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_validate_requires_pms() {
        assert!(matches!(
            PlannerConfig::default().validate(),
            Err(PlannerError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validate_fixed_memory_in_theta() {
        let mut c = sample();
        c.experiment.fixed_vm_count = 2;
        c.experiment.fixed_memory_gb = 12;
        assert!(matches!(c.validate(), Err(PlannerError::Allocation(_))));
    }

    #[test]
    fn test_validate_bandwidth() {
        let mut c = sample();
        c.bandwidth.pairs.push(BandwidthPair { a: 0, b: 1, bandwidth: -1.0 });
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_external_solver_needs_section() {
        let mut c = sample();
        c.strategy = "tbs".into();
        assert!(c.validate().is_err());
        assert!(c.create_strategy().is_err());

        c.solver = Some(SolverSettings {
            program: "/bin/true".into(),
            working_dir: "/tmp".into(),
            preconfiguration: default_preconfiguration(),
            error_markers: default_error_markers(),
            max_attempts: 4,
            unbounded: false,
            deadline_secs: Some(5),
        });
        c.validate().unwrap();
        assert_eq!(c.create_strategy().unwrap().kind(), StrategyKind::ExternalSolver);
    }

    #[test]
    fn test_create_strategy() {
        let mut c = sample();
        assert_eq!(c.create_strategy().unwrap().name(), "multilevel");
        c.strategy = "METIS".into();
        assert_eq!(c.create_strategy().unwrap().kind(), StrategyKind::Multilevel);
        c.strategy = "naive".into();
        assert_eq!(c.create_strategy().unwrap().name(), "naive");
        c.strategy = "bogus".into();
        assert!(matches!(c.create_strategy(), Err(PlannerError::ConfigError(_))));
    }

    #[test]
    fn test_multilevel_settings() {
        let s = MultilevelSettings::default();
        assert_eq!(s.retry_policy(), RetryPolicy::Bounded(16));
        assert!(s.partitioner().is_deterministic());

        let s = MultilevelSettings {
            seed: None,
            unbounded: true,
            ..Default::default()
        };
        assert_eq!(s.retry_policy(), RetryPolicy::Unbounded);
        assert!(!s.partitioner().is_deterministic());
        assert!(s.deterministic().is_deterministic());
    }

    #[test]
    fn test_resolve_threads() {
        let c = PlannerConfig {
            num_threads: Some(8),
            ..Default::default()
        };
        assert_eq!(c.resolve_threads(), 8);
        assert!(PlannerConfig::default().resolve_threads() >= 1);
    }
}
