// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The planning pipeline with type-state–enforced stage ordering.
//!
//! ```text
//! Planner<Idle>
//!     │  .load()
//!     ▼
//! Planner<Loaded>
//!     │  .partition_pms()
//!     ▼
//! Planner<PmPartitioned>
//!     │  .allocate()
//!     ▼
//! Planner<Allocated>
//!     │  .partition_vms()
//!     ▼
//! Planner<VmPartitioned>
//!     │  .materialize()
//!     ▼
//!   PlanOutput
//! ```
//!
//! Each state transition consumes the old value and returns a new one,
//! carrying exactly the data that stage produced.

use crate::materialize::{self, sub_topology_file_name, SubTopology};
use crate::metrics::{PlanMetrics, Stage};
use crate::tdf::compute_tdf;
use crate::{PlannerConfig, PlannerError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use topo_graph::{graph::Validated, Graph, TopoLoader};
use topo_partition::{
    partition_across_pms, partition_across_vms, server_offsets, server_to_pm, total_servers,
    Assignment, PmId, PmPartition, ServerId,
};
use vm_allocator::{optimize, EmaxTable, SearchResult};

// ── Type-state markers ─────────────────────────────────────────

/// Planner is created but no topology is loaded.
#[derive(Debug)]
pub struct Idle;

/// The topology is loaded and validated.
#[derive(Debug)]
pub struct Loaded {
    graph: Arc<Graph<Validated>>,
}

/// Nodes are assigned to physical machines.
#[derive(Debug)]
pub struct PmPartitioned {
    graph: Arc<Graph<Validated>>,
    pms: Arc<PmPartition>,
}

/// Every PM has a VM allocation.
#[derive(Debug)]
pub struct Allocated {
    graph: Arc<Graph<Validated>>,
    pms: Arc<PmPartition>,
    allocations: BTreeMap<PmId, PmAllocation>,
    vm_counts: BTreeMap<PmId, usize>,
}

/// Nodes are assigned to global servers.
#[derive(Debug)]
pub struct VmPartitioned {
    graph: Arc<Graph<Validated>>,
    pms: Arc<PmPartition>,
    allocations: BTreeMap<PmId, PmAllocation>,
    vm_counts: BTreeMap<PmId, usize>,
    server_of: Assignment,
}

/// Trait for planner states.
pub trait PlannerState: std::fmt::Debug {}
impl PlannerState for Idle {}
impl PlannerState for Loaded {}
impl PlannerState for PmPartitioned {}
impl PlannerState for Allocated {}
impl PlannerState for VmPartitioned {}

// ── Stage results ──────────────────────────────────────────────

/// The optimizer's output for one PM.
#[derive(Debug, Clone)]
pub struct PmAllocation {
    pub emax: EmaxTable,
    pub search: SearchResult,
    /// `false` when the optimum needs more VMs than the PM can host.
    pub legal: bool,
}

/// Everything a planning run produced.
#[derive(Debug)]
pub struct PlanOutput {
    /// Topology the plan was made for; names the sub-topology files.
    pub topology: PathBuf,
    pub pm_partition: PmPartition,
    pub allocations: BTreeMap<PmId, PmAllocation>,
    /// VMs per PM used for server numbering.
    pub vm_counts: BTreeMap<PmId, usize>,
    pub server_of: Assignment,
    pub server_to_pm: BTreeMap<ServerId, PmId>,
    /// One entry per server, indexed by server id.
    pub sub_topologies: Vec<SubTopology>,
    pub tdf: f64,
    pub metrics: PlanMetrics,
}

impl PlanOutput {
    /// Returns `true` if every PM's allocation fits its VM limit.
    pub fn is_legal(&self) -> bool {
        self.allocations.values().all(|a| a.legal)
    }

    /// Writes the plan under `dir`:
    ///
    /// ```text
    /// <dir>/<stem>.sub<i>.<ext>          one per server
    /// <dir>/tdf.txt                      "TDF: <value>"
    /// <dir>/vm_alloc_result/pm_<id>.csv  search trace per PM
    /// ```
    pub fn write_to(&self, dir: &Path) -> Result<(), PlannerError> {
        std::fs::create_dir_all(dir)?;
        for sub in &self.sub_topologies {
            sub.write(&dir.join(sub_topology_file_name(&self.topology, sub.server)))?;
        }
        std::fs::write(dir.join("tdf.txt"), format!("TDF: {}\n", self.tdf))?;

        let traces = dir.join("vm_alloc_result");
        std::fs::create_dir_all(&traces)?;
        for (pm, allocation) in &self.allocations {
            std::fs::write(
                traces.join(format!("pm_{pm}.csv")),
                allocation.search.to_csv(),
            )?;
        }
        tracing::info!("plan written to {}", dir.display());
        Ok(())
    }
}

// ── Planner ────────────────────────────────────────────────────

/// The placement planner.
///
/// `S` is a type-state marker that enforces the stage ordering at compile
/// time: VMs cannot be partitioned before they are allocated, and nothing
/// can be materialized before every node has a server.
///
/// # Example
/// ```no_run
/// use planner::{Planner, PlannerConfig};
///
/// # async fn example() -> Result<(), planner::PlannerError> {
/// let config = PlannerConfig::from_file("plan.toml".as_ref())?;
/// let output = Planner::new(config)
///     .load()?
///     .partition_pms()
///     .await?
///     .allocate()
///     .await?
///     .partition_vms()
///     .await?
///     .materialize()?;
/// println!("{}", output.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct Planner<S: PlannerState = Idle> {
    config: Arc<PlannerConfig>,
    metrics: PlanMetrics,
    state: S,
}

impl<S: PlannerState> Planner<S> {
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &PlanMetrics {
        &self.metrics
    }

    fn advance<T: PlannerState>(self, state: T) -> Planner<T> {
        Planner {
            config: self.config,
            metrics: self.metrics,
            state,
        }
    }
}

// ── Idle → Loaded ──────────────────────────────────────────────

impl Planner<Idle> {
    /// Creates a new planner from the given configuration.
    pub fn new(config: PlannerConfig) -> Self {
        tracing::info!(
            "planner created: {} PM(s), strategy '{}'",
            config.pm_count(),
            config.strategy
        );
        Self {
            config: Arc::new(config),
            metrics: PlanMetrics::new(),
            state: Idle,
        }
    }

    /// Validates the configuration and loads the topology.
    pub fn load(self) -> Result<Planner<Loaded>, PlannerError> {
        self.config.validate()?;
        let started = Instant::now();
        let graph = TopoLoader::load(&self.config.topology)?;
        tracing::info!("{}", graph.summary());

        let mut planner = self.advance(Loaded {
            graph: Arc::new(graph),
        });
        planner.metrics.record_stage(Stage::Load, started.elapsed());
        planner.record_graph_size();
        Ok(planner)
    }

    /// Runs every stage in order.
    ///
    /// Illegal allocations are logged but do not stop the run; callers that
    /// must reject them drive the stages themselves and check legality
    /// after `allocate`.
    pub async fn run(self) -> Result<PlanOutput, PlannerError> {
        self.load()?
            .partition_pms()
            .await?
            .allocate()
            .await?
            .partition_vms()
            .await?
            .materialize()
    }

    /// Starts from an already loaded topology.
    pub fn from_graph(config: PlannerConfig, graph: Graph<Validated>) -> Planner<Loaded> {
        let mut planner = Planner::new(config).advance(Loaded {
            graph: Arc::new(graph),
        });
        planner.record_graph_size();
        planner
    }

    /// Starts from a given PM split, e.g. one forced by the caller.
    ///
    /// # Errors
    /// [`PlannerError::ConfigError`] if the split's PM count differs from
    /// the number of configured PMs.
    pub fn from_pm_partition(
        config: PlannerConfig,
        graph: Graph<Validated>,
        pm_partition: PmPartition,
    ) -> Result<Planner<PmPartitioned>, PlannerError> {
        config.validate()?;
        if pm_partition.pm_count() != config.pm_count() {
            return Err(PlannerError::ConfigError(format!(
                "PM split has {} PMs, configuration has {}",
                pm_partition.pm_count(),
                config.pm_count()
            )));
        }
        let loaded = Planner::from_graph(config, graph);
        let graph = Arc::clone(&loaded.state.graph);
        let mut planner = loaded.advance(PmPartitioned {
            graph,
            pms: Arc::new(pm_partition),
        });
        planner.metrics.cross_pm_edges = planner.state.pms.cross_pm_edges().len();
        Ok(planner)
    }
}

// ── Loaded → PmPartitioned ─────────────────────────────────────

impl Planner<Loaded> {
    pub fn graph(&self) -> &Graph<Validated> {
        &self.state.graph
    }

    fn record_graph_size(&mut self) {
        self.metrics.node_count = self.state.graph.node_count();
        self.metrics.edge_count = self.state.graph.edge_count();
        self.metrics.pm_count = self.config.pm_count();
    }

    /// Splits the topology across the configured PMs with the configured
    /// strategy.
    pub async fn partition_pms(self) -> Result<Planner<PmPartitioned>, PlannerError> {
        self.config.validate()?;
        let strategy = self.config.create_strategy()?;
        let pm_count = self.config.pm_count();
        let graph = Arc::clone(&self.state.graph);

        let started = Instant::now();
        let pms = {
            let graph = Arc::clone(&graph);
            tokio::task::spawn_blocking(move || partition_across_pms(&strategy, &graph, pm_count))
                .await
                .map_err(|e| PlannerError::TaskFailed(format!("PM partitioning: {e}")))??
        };
        tracing::info!("{}", pms.summary());

        let mut planner = self.advance(PmPartitioned {
            graph,
            pms: Arc::new(pms),
        });
        planner
            .metrics
            .record_stage(Stage::PmPartition, started.elapsed());
        planner.metrics.cross_pm_edges = planner.state.pms.cross_pm_edges().len();
        Ok(planner)
    }
}

// ── PmPartitioned → Allocated ──────────────────────────────────

impl Planner<PmPartitioned> {
    pub fn graph(&self) -> &Graph<Validated> {
        &self.state.graph
    }

    pub fn pm_partition(&self) -> &PmPartition {
        &self.state.pms
    }

    /// Runs the resource allocation optimizer for every PM in parallel.
    pub async fn allocate(self) -> Result<Planner<Allocated>, PlannerError> {
        let started = Instant::now();
        let config = Arc::clone(&self.config);
        let pms = Arc::clone(&self.state.pms);
        let partitioner = self.config.multilevel.deterministic();

        let allocations = per_pm(
            Stage::Allocate,
            pm_ids(&self.state.pms),
            self.config.resolve_threads(),
            move |pm| {
                let pm_config = config.pms.get(pm).ok_or_else(|| missing_pm(pm))?;
                let graph = pms.subgraph(pm).ok_or_else(|| missing_pm(pm))?;
                let (emax, search) =
                    optimize(graph, pm_config, &config.experiment, &partitioner)?;
                let legal = search.is_legal(pm_config);
                if legal {
                    tracing::info!("PM {pm}: allocation {}", search.optimum);
                } else {
                    tracing::warn!(
                        "PM {pm}: allocation {} exceeds max_vm_count {}",
                        search.optimum,
                        pm_config.max_vm_count
                    );
                }
                Ok(PmAllocation {
                    emax,
                    search,
                    legal,
                })
            },
        )
        .await?;

        let vm_counts = allocations
            .iter()
            .map(|(&pm, a)| (pm, a.search.optimum.vm_count))
            .collect();
        let state = Allocated {
            graph: Arc::clone(&self.state.graph),
            pms: Arc::clone(&self.state.pms),
            allocations,
            vm_counts,
        };
        let mut planner = self.advance(state);
        planner.metrics.record_stage(Stage::Allocate, started.elapsed());
        Ok(planner)
    }
}

// ── Allocated → VmPartitioned ──────────────────────────────────

impl Planner<Allocated> {
    pub fn pm_partition(&self) -> &PmPartition {
        &self.state.pms
    }

    pub fn allocations(&self) -> &BTreeMap<PmId, PmAllocation> {
        &self.state.allocations
    }

    /// VMs per PM that VM partitioning will use.
    pub fn vm_counts(&self) -> &BTreeMap<PmId, usize> {
        &self.state.vm_counts
    }

    /// Per-PM legality: `n_opt <= max_vm_count`.
    pub fn legality(&self) -> BTreeMap<PmId, bool> {
        self.state
            .allocations
            .iter()
            .map(|(&pm, a)| (pm, a.legal))
            .collect()
    }

    pub fn is_legal(&self) -> bool {
        self.state.allocations.values().all(|a| a.legal)
    }

    /// PMs whose optimum exceeds their VM limit.
    pub fn illegal_pms(&self) -> Vec<PmId> {
        self.state
            .allocations
            .iter()
            .filter(|(_, a)| !a.legal)
            .map(|(&pm, _)| pm)
            .collect()
    }

    /// Replaces the optimizer's VM counts with the counts the VM lifecycle
    /// manager actually brought up.
    ///
    /// # Errors
    /// [`PlannerError::ConfigError`] if a PM is missing or has zero VMs.
    pub fn with_realized_vm_counts(
        mut self,
        vm_counts: BTreeMap<PmId, usize>,
    ) -> Result<Self, PlannerError> {
        for pm in self.state.allocations.keys() {
            match vm_counts.get(pm) {
                Some(&n) if n >= 1 => {}
                Some(_) => {
                    return Err(PlannerError::ConfigError(format!(
                        "PM {pm}: realized VM count must be at least 1"
                    )))
                }
                None => {
                    return Err(PlannerError::ConfigError(format!(
                        "PM {pm}: no realized VM count"
                    )))
                }
            }
        }
        if vm_counts.len() != self.state.allocations.len() {
            return Err(PlannerError::ConfigError(format!(
                "realized VM counts name {} PMs, plan has {}",
                vm_counts.len(),
                self.state.allocations.len()
            )));
        }
        self.state.vm_counts = vm_counts;
        Ok(self)
    }

    /// Splits every PM's subgraph across its VMs in parallel.
    ///
    /// Server-id offsets are fixed before dispatch so that PM `p`'s servers
    /// are `offset(p) .. offset(p) + vm_count(p)`.
    pub async fn partition_vms(self) -> Result<Planner<VmPartitioned>, PlannerError> {
        let started = Instant::now();
        let offsets = server_offsets(&self.state.vm_counts);
        let vm_counts = self.state.vm_counts.clone();
        let pms = Arc::clone(&self.state.pms);
        let partitioner = self.config.multilevel.partitioner();

        let per_pm_servers = per_pm(
            Stage::VmPartition,
            pm_ids(&self.state.pms),
            self.config.resolve_threads(),
            move |pm| {
                let graph = pms.subgraph(pm).ok_or_else(|| missing_pm(pm))?;
                let count = vm_counts.get(&pm).copied().ok_or_else(|| missing_pm(pm))?;
                let offset = offsets.get(&pm).copied().ok_or_else(|| missing_pm(pm))?;
                tracing::debug!("PM {pm}: {count} VM(s) from server {offset}");
                Ok(partition_across_vms(&partitioner, graph, count, offset)?)
            },
        )
        .await?;

        let server_of = per_pm_servers
            .into_values()
            .try_fold(Assignment::default(), Assignment::merge)?;

        let Planner {
            config,
            mut metrics,
            state,
        } = self;
        metrics.record_stage(Stage::VmPartition, started.elapsed());
        Ok(Planner {
            config,
            metrics,
            state: VmPartitioned {
                graph: state.graph,
                pms: state.pms,
                allocations: state.allocations,
                vm_counts: state.vm_counts,
                server_of,
            },
        })
    }
}

// ── VmPartitioned → PlanOutput ─────────────────────────────────

impl Planner<VmPartitioned> {
    pub fn server_of(&self) -> &Assignment {
        &self.state.server_of
    }

    pub fn server_to_pm(&self) -> BTreeMap<ServerId, PmId> {
        server_to_pm(&self.state.vm_counts)
    }

    /// Builds the per-server sub-topologies and computes the TDF.
    pub fn materialize(self) -> Result<PlanOutput, PlannerError> {
        let started = Instant::now();
        let state = self.state;
        let server_count = total_servers(&state.vm_counts);
        let owners = server_to_pm(&state.vm_counts);

        let sub_topologies = materialize::materialize(&state.graph, &state.server_of, server_count)?;
        let tdf = compute_tdf(
            &state.graph,
            &state.server_of,
            &owners,
            &self.config.bandwidth.table(),
        )?;

        let mut metrics = self.metrics;
        metrics.record_stage(Stage::Materialize, started.elapsed());
        metrics.server_count = server_count;
        metrics.tunnel_count = sub_topologies
            .iter()
            .map(|s| s.dangling.len())
            .sum::<usize>()
            / 2;
        metrics.tdf = tdf;
        tracing::info!("{}", metrics.summary());

        Ok(PlanOutput {
            topology: self.config.topology.clone(),
            pm_partition: Arc::try_unwrap(state.pms).unwrap_or_else(|pms| (*pms).clone()),
            allocations: state.allocations,
            vm_counts: state.vm_counts,
            server_of: state.server_of,
            server_to_pm: owners,
            sub_topologies,
            tdf,
            metrics,
        })
    }
}

impl<S: PlannerState> std::fmt::Debug for Planner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("state", &std::any::type_name::<S>())
            .field("strategy", &self.config.strategy)
            .field("pm_count", &self.config.pm_count())
            .finish()
    }
}

// ── Private helpers ────────────────────────────────────────────

fn pm_ids(pms: &PmPartition) -> Vec<PmId> {
    (0..pms.pm_count()).collect()
}

fn missing_pm(pm: PmId) -> PlannerError {
    PlannerError::ConfigError(format!("PM {pm} is not configured"))
}

/// Runs `work` for every PM on the blocking pool, at most `permits` at a
/// time, and collects the results by PM id.
async fn per_pm<T, F>(
    stage: Stage,
    pms: Vec<PmId>,
    permits: usize,
    work: F,
) -> Result<BTreeMap<PmId, T>, PlannerError>
where
    T: Send + 'static,
    F: Fn(PmId) -> Result<T, PlannerError> + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(permits.max(1)));
    let work = Arc::new(work);
    let mut tasks = JoinSet::new();

    for pm in pms {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| PlannerError::TaskFailed(format!("{}: {e}", stage.as_str())))?;
        let work = Arc::clone(&work);
        tasks.spawn_blocking(move || {
            let _permit = permit;
            (pm, work(pm))
        });
    }

    let mut results = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (pm, result) =
            joined.map_err(|e| PlannerError::TaskFailed(format!("{}: {e}", stage.as_str())))?;
        results.insert(pm, result?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::FIRST_TUNNEL_ID;
    use topo_partition::PartitionError;
    use vm_allocator::{PmConfig, ThetaTable};

    fn ring(n: usize) -> Graph<Validated> {
        let nodes: Vec<String> = (0..n).map(|i| format!("n{i}")).collect();
        let mut text = nodes.join(" ");
        text.push('\n');
        for i in 0..n {
            text.push_str(&format!("{} {}\n", nodes[i], nodes[(i + 1) % n]));
        }
        TopoLoader::parse(&text).unwrap()
    }

    fn pm_config(core_count: usize, max_vm_count: usize) -> PmConfig {
        PmConfig {
            core_count,
            memory_gb: 64,
            max_vm_count,
            x: 0.01,
            y: 0.001,
            z: 0.1,
            theta: ThetaTable::new(BTreeMap::from([(8, 1.0), (16, 1.5)])).unwrap(),
        }
    }

    fn config(pm_count: usize) -> PlannerConfig {
        let mut c = PlannerConfig {
            pms: (0..pm_count).map(|_| pm_config(4, 8)).collect(),
            num_threads: Some(2),
            ..Default::default()
        };
        c.experiment.memory_requirement_gb = 16.0;
        c
    }

    fn first_half(graph: &Graph<Validated>) -> PmPartition {
        let half = graph.node_count() / 2;
        let assignment: Assignment = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), usize::from(i >= half)))
            .collect();
        PmPartition::from_assignment(graph, assignment, 2).unwrap()
    }

    #[test]
    fn test_from_graph() {
        let planner = Planner::from_graph(config(2), ring(8));
        assert_eq!(planner.graph().node_count(), 8);
        assert_eq!(planner.metrics().edge_count, 8);
    }

    #[test]
    fn test_from_pm_partition_checks_pm_count() {
        let g = ring(6);
        let split = first_half(&g);
        assert!(matches!(
            Planner::from_pm_partition(config(3), g, split),
            Err(PlannerError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_partition_pms_single_pm() {
        let planner = Planner::from_graph(config(1), ring(10))
            .partition_pms()
            .await
            .unwrap();
        assert_eq!(planner.pm_partition().node_count(0), 10);
        assert!(planner.pm_partition().cross_pm_edges().is_empty());
    }

    #[tokio::test]
    async fn test_allocate_and_override_vm_counts() {
        let g = ring(8);
        let split = first_half(&g);
        let allocated = Planner::from_pm_partition(config(2), g, split)
            .unwrap()
            .allocate()
            .await
            .unwrap();

        assert_eq!(allocated.allocations().len(), 2);
        for a in allocated.allocations().values() {
            assert_eq!(a.emax.len(), 4);
            assert!(a.legal);
        }
        assert!(allocated.is_legal());
        assert!(allocated.illegal_pms().is_empty());

        let allocated = allocated
            .with_realized_vm_counts(BTreeMap::from([(0, 2), (1, 1)]))
            .unwrap();
        assert_eq!(allocated.vm_counts()[&0], 2);
        assert!(allocated
            .with_realized_vm_counts(BTreeMap::from([(0, 0), (1, 1)]))
            .is_err());
    }

    #[tokio::test]
    async fn test_illegal_allocation_flagged() {
        let mut c = config(1);
        c.pms[0] = pm_config(8, 1);
        c.experiment.memory_requirement_gb = 32.0;
        let allocated = Planner::from_graph(c, ring(12))
            .partition_pms()
            .await
            .unwrap()
            .allocate()
            .await
            .unwrap();
        let optimum = allocated.allocations()[&0].search.optimum;
        assert_eq!(allocated.is_legal(), optimum.vm_count <= 1);
        assert_eq!(allocated.legality()[&0], allocated.is_legal());
    }

    #[tokio::test]
    async fn test_servers_are_contiguous() {
        let g = ring(12);
        let split = first_half(&g);
        let planner = Planner::from_pm_partition(config(2), g, split)
            .unwrap()
            .allocate()
            .await
            .unwrap()
            .with_realized_vm_counts(BTreeMap::from([(0, 2), (1, 3)]))
            .unwrap()
            .partition_vms()
            .await
            .unwrap();

        let owners = planner.server_to_pm();
        assert_eq!(owners.len(), 5);
        for (node, server) in planner.server_of().iter() {
            let pm = usize::from(node.trim_start_matches('n').parse::<usize>().unwrap() >= 6);
            assert_eq!(owners[&server], pm, "{node} on server {server}");
        }
    }

    #[tokio::test]
    async fn test_materialize_output() {
        let g = ring(8);
        let split = first_half(&g);
        let output = Planner::from_pm_partition(config(2), g, split)
            .unwrap()
            .allocate()
            .await
            .unwrap()
            .with_realized_vm_counts(BTreeMap::from([(0, 1), (1, 1)]))
            .unwrap()
            .partition_vms()
            .await
            .unwrap()
            .materialize()
            .unwrap();

        assert_eq!(output.sub_topologies.len(), 2);
        assert_eq!(output.metrics.tunnel_count, 2);
        assert_eq!(output.metrics.cross_pm_edges, 2);
        // Two ring edges cross, default bandwidth 10000.
        assert_eq!(output.tdf, 20.0 / 10_000.0);
        for sub in &output.sub_topologies {
            assert!(sub.tunnels().all(|t| t >= FIRST_TUNNEL_ID));
        }
    }

    #[tokio::test]
    async fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = config(2);
        c.topology = PathBuf::from("ring.txt");
        let g = ring(8);
        let split = first_half(&g);
        let output = Planner::from_pm_partition(c, g, split)
            .unwrap()
            .allocate()
            .await
            .unwrap()
            .with_realized_vm_counts(BTreeMap::from([(0, 1), (1, 1)]))
            .unwrap()
            .partition_vms()
            .await
            .unwrap()
            .materialize()
            .unwrap();
        output.write_to(dir.path()).unwrap();

        assert!(dir.path().join("ring.sub0.txt").exists());
        assert!(dir.path().join("ring.sub1.txt").exists());
        let tdf = std::fs::read_to_string(dir.path().join("tdf.txt")).unwrap();
        assert!(tdf.starts_with("TDF: "));
        let csv =
            std::fs::read_to_string(dir.path().join("vm_alloc_result").join("pm_0.csv")).unwrap();
        assert!(csv.starts_with("n,m,m_extra,Gain\n"));
    }

    #[tokio::test]
    async fn test_per_pm_collects_by_id() {
        let out = per_pm(Stage::Allocate, vec![2, 0, 1], 2, |pm| Ok(pm * 10))
            .await
            .unwrap();
        assert_eq!(out, BTreeMap::from([(0, 0), (1, 10), (2, 20)]));
    }

    #[tokio::test]
    async fn test_per_pm_propagates_errors() {
        let out: Result<BTreeMap<PmId, ()>, _> = per_pm(Stage::Allocate, vec![0, 1], 1, |pm| {
            if pm == 1 {
                Err(PartitionError::EmptyGraph.into())
            } else {
                Ok(())
            }
        })
        .await;
        assert!(matches!(out, Err(PlannerError::Partition(PartitionError::EmptyGraph))));
    }

    #[tokio::test]
    async fn test_panicked_task_is_reported() {
        let out: Result<BTreeMap<PmId, ()>, _> =
            per_pm(Stage::VmPartition, vec![0], 1, |_| panic!("boom")).await;
        assert!(matches!(out, Err(PlannerError::TaskFailed(_))));
    }

    #[test]
    fn test_debug_format() {
        let planner = Planner::new(config(2));
        let debug = format!("{planner:?}");
        assert!(debug.contains("Planner"));
        assert!(debug.contains("Idle"));
        assert!(debug.contains("multilevel"));
    }
}
