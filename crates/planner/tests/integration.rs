// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: end-to-end placement pipeline.
//!
//! These tests exercise the complete flow from topology loading → PM
//! partitioning → VM allocation → VM partitioning → materialization,
//! proving that the four library crates compose correctly and that the
//! type-state transitions work end-to-end.

use planner::{
    compute_tdf, BandwidthTable, Planner, PlannerConfig, SubTopology, FIRST_TUNNEL_ID,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use topo_graph::{graph::Validated, Graph, TopoLoader};
use topo_partition::{
    partition_across_pms, Assignment, Multilevel, Naive, Partitioner, PmPartition,
};
use vm_allocator::{PmConfig, ThetaTable};

// ── Helpers ────────────────────────────────────────────────────

fn ring(n: usize) -> Graph<Validated> {
    let nodes: Vec<String> = (0..n).map(|i| format!("r{i}")).collect();
    let mut text = nodes.join(" ");
    text.push('\n');
    for i in 0..n {
        text.push_str(&format!("{} {}\n", nodes[i], nodes[(i + 1) % n]));
    }
    TopoLoader::parse(&text).unwrap()
}

/// `rows × cols` grid topology text.
fn grid_text(rows: usize, cols: usize) -> String {
    let name = |r: usize, c: usize| format!("h{r}_{c}");
    let mut nodes = Vec::new();
    let mut edges = String::new();
    for r in 0..rows {
        for c in 0..cols {
            nodes.push(name(r, c));
            if c + 1 < cols {
                edges.push_str(&format!("{} {}\n", name(r, c), name(r, c + 1)));
            }
            if r + 1 < rows {
                edges.push_str(&format!("{} {}\n", name(r, c), name(r + 1, c)));
            }
        }
    }
    format!("{}\n{edges}", nodes.join(" "))
}

fn pm_config() -> PmConfig {
    PmConfig {
        core_count: 4,
        memory_gb: 64,
        max_vm_count: 4,
        x: 0.01,
        y: 0.001,
        z: 0.1,
        theta: ThetaTable::new(BTreeMap::from([(8, 1.0), (16, 1.5), (32, 2.5)])).unwrap(),
    }
}

fn config(pm_count: usize) -> PlannerConfig {
    let mut c = PlannerConfig {
        pms: (0..pm_count).map(|_| pm_config()).collect(),
        num_threads: Some(2),
        ..Default::default()
    };
    c.experiment.memory_requirement_gb = 16.0;
    c
}

/// First `n / 2` nodes in load order on PM 0, the rest on PM 1.
fn halves(graph: &Graph<Validated>) -> PmPartition {
    let half = graph.node_count() / 2;
    let assignment: Assignment = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, n)| (n.clone(), usize::from(i >= half)))
        .collect();
    PmPartition::from_assignment(graph, assignment, 2).unwrap()
}

fn tunnel_uses(subs: &[SubTopology]) -> BTreeMap<u32, usize> {
    let mut uses = BTreeMap::new();
    for t in subs.iter().flat_map(SubTopology::tunnels) {
        *uses.entry(t).or_insert(0) += 1;
    }
    uses
}

// ── Graph Loading ──────────────────────────────────────────────

#[test]
fn test_isolated_nodes_are_pruned() {
    let chain = TopoLoader::parse("A B C\nA B\nB C\n").unwrap();
    assert_eq!(chain.nodes(), &["A", "B", "C"]);

    let with_isolated = TopoLoader::parse("A B C D\nA B\nB C\n").unwrap();
    assert_eq!(with_isolated.nodes(), &["A", "B", "C"]);
}

// ── PM Partitioning ────────────────────────────────────────────

#[test]
fn test_single_pm_keeps_everything() {
    let g = ring(9);
    let strategies: Vec<Box<dyn Partitioner>> =
        vec![Box::new(Naive::new()), Box::new(Multilevel::new())];
    for strategy in &strategies {
        let p = partition_across_pms(strategy.as_ref(), &g, 1).unwrap();
        assert_eq!(p.node_count(0), 9);
        assert!(p.cross_pm_edges().is_empty());
    }
}

#[test]
fn test_pm_subgraphs_cover_graph_without_shared_edges() {
    let g = TopoLoader::parse(&grid_text(6, 6)).unwrap();
    let strategies: Vec<Box<dyn Partitioner>> = vec![
        Box::new(Naive::with_seed(3)),
        Box::new(Multilevel::new()),
    ];

    for strategy in &strategies {
        let p = partition_across_pms(strategy.as_ref(), &g, 3).unwrap();

        let mut covered = BTreeSet::new();
        let mut seen_edges = BTreeSet::new();
        let mut intra = 0;
        for (_, sub) in p.subgraphs() {
            for node in sub.nodes() {
                assert!(covered.insert(node.clone()), "{node} on two PMs");
            }
            for (u, v) in sub.edges() {
                assert!(seen_edges.insert((u.clone(), v.clone())));
                intra += 1;
            }
        }
        let all: BTreeSet<String> = g.nodes().iter().cloned().collect();
        assert_eq!(covered, all, "strategy {}", strategy.name());
        assert_eq!(intra + p.cross_pm_edges().len(), g.edge_count());
    }
}

// ── Materialization ────────────────────────────────────────────

#[tokio::test]
async fn test_ring_split_three_three() {
    let g = ring(6);
    let split = halves(&g);
    assert_eq!(split.cross_pm_edges().len(), 2);

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
    for sub in &output.sub_topologies {
        assert_eq!(sub.nodes.len(), 3);
        assert_eq!(sub.edges.len(), 2);
        assert_eq!(sub.dangling.len(), 2);
        let tunnels: BTreeSet<u32> = sub.tunnels().collect();
        assert_eq!(tunnels.len(), 2);
        assert!(tunnels.iter().all(|&t| t >= FIRST_TUNNEL_ID));
    }
    assert_eq!(output.server_to_pm, BTreeMap::from([(0, 0), (1, 1)]));
}

#[tokio::test]
async fn test_tunnels_numbered_from_first_id() {
    let g = TopoLoader::parse(&grid_text(4, 4)).unwrap();
    let split = halves(&g);
    let output = Planner::from_pm_partition(config(2), g, split)
        .unwrap()
        .allocate()
        .await
        .unwrap()
        .with_realized_vm_counts(BTreeMap::from([(0, 2), (1, 2)]))
        .unwrap()
        .partition_vms()
        .await
        .unwrap()
        .materialize()
        .unwrap();

    let graph = TopoLoader::parse(&grid_text(4, 4)).unwrap();
    let cross = graph
        .edges()
        .filter(|(u, v)| output.server_of.get(u) != output.server_of.get(v))
        .count();
    let uses = tunnel_uses(&output.sub_topologies);

    assert_eq!(uses.len(), cross);
    assert!(uses.values().all(|&n| n == 2));
    let expected: Vec<u32> = (FIRST_TUNNEL_ID..FIRST_TUNNEL_ID + cross as u32).collect();
    assert_eq!(uses.keys().copied().collect::<Vec<_>>(), expected);
    assert_eq!(output.metrics.tunnel_count, cross);
}

// ── TDF ────────────────────────────────────────────────────────

#[test]
fn test_tdf_single_cross_link() {
    // a-b | c-d joined by b-c.
    let g = TopoLoader::parse("a b c d\na b\nb c\nc d\n").unwrap();
    let servers: Assignment = [("a", 0), ("b", 0), ("c", 1), ("d", 1)]
        .iter()
        .map(|(n, s)| (n.to_string(), *s))
        .collect();
    let owners = BTreeMap::from([(0, 0), (1, 1)]);
    let bandwidth = BandwidthTable::new(100.0).with_pair(0, 1, 10.0);
    assert_eq!(compute_tdf(&g, &servers, &owners, &bandwidth).unwrap(), 1.0);

    let together = Assignment::uniform(&g, 0);
    assert_eq!(compute_tdf(&g, &together, &owners, &bandwidth).unwrap(), 0.0);
}

// ── Full Pipeline ──────────────────────────────────────────────

fn write_topology(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("grid.txt");
    std::fs::write(&path, text).unwrap();
    path
}

#[tokio::test]
async fn test_end_to_end_multilevel() {
    let dir = tempfile::tempdir().unwrap();
    let mut c = config(2);
    c.topology = write_topology(dir.path(), &grid_text(8, 8));
    c.output_dir = dir.path().join("out");

    let output = Planner::new(c.clone()).run().await.unwrap();
    assert_eq!(output.metrics.node_count, 64);
    assert_eq!(output.server_of.len(), 64);
    assert_eq!(
        output.sub_topologies.len(),
        output.vm_counts.values().sum::<usize>()
    );
    assert!(output.tdf >= 0.0);

    output.write_to(&c.output_dir).unwrap();
    let mut owned = 0;
    for sub in &output.sub_topologies {
        let path = c.output_dir.join(format!("grid.sub{}.txt", sub.server));
        let text = std::fs::read_to_string(&path).unwrap();
        let back = SubTopology::parse(sub.server, &text).unwrap();
        assert_eq!(&back, sub);
        owned += back.nodes.len();
    }
    assert_eq!(owned, 64);
    assert!(c.output_dir.join("tdf.txt").exists());
    assert!(c.output_dir.join("vm_alloc_result/pm_1.csv").exists());
}

#[tokio::test]
async fn test_end_to_end_naive() {
    let dir = tempfile::tempdir().unwrap();
    let mut c = config(3);
    c.strategy = "naive".into();
    c.topology = write_topology(dir.path(), &grid_text(5, 5));

    let output = Planner::new(c).run().await.unwrap();
    assert_eq!(output.pm_partition.pm_count(), 3);
    for (node, server) in output.server_of.iter() {
        let pm = output.pm_partition.pm_of(node).unwrap();
        assert_eq!(output.server_to_pm[&server], pm);
    }
}

#[tokio::test]
async fn test_missing_topology_fails() {
    let mut c = config(1);
    c.topology = "/nonexistent/topology.txt".into();
    assert!(Planner::new(c).run().await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_end_to_end_external_solver() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let program = dir.path().join("solver.sh");
    std::fs::write(
        &program,
        "#!/bin/sh\nprintf '0\\n0\\n0\\n1\\n1\\n1\\n' > tmppartition2\n",
    )
    .unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    let topology = dir.path().join("ring.txt");
    std::fs::write(&topology, "r0 r1 r2 r3 r4 r5\nr0 r1\nr1 r2\nr2 r3\nr3 r4\nr4 r5\nr5 r0\n")
        .unwrap();

    let toml = format!(
        r#"
topology = "{topology}"
strategy = "external-solver"

[experiment]
memory_requirement_gb = 16.0

[solver]
program = "{program}"
working_dir = "{dir}"
max_attempts = 3

[[pms]]
core_count = 4
memory_gb = 64
max_vm_count = 4
x = 0.01
y = 0.001
z = 0.1
theta = {{ "8" = 1.0, "16" = 1.5 }}

[[pms]]
core_count = 4
memory_gb = 64
max_vm_count = 4
x = 0.01
y = 0.001
z = 0.1
theta = {{ "8" = 1.0, "16" = 1.5 }}
"#,
        topology = topology.display(),
        program = program.display(),
        dir = dir.path().display(),
    );
    let c = PlannerConfig::from_toml(&toml).unwrap();

    let pms = Planner::new(c)
        .load()
        .unwrap()
        .partition_pms()
        .await
        .unwrap();
    assert_eq!(pms.pm_partition().nodes(0), &["r0", "r1", "r2"]);
    assert_eq!(pms.pm_partition().cross_pm_edges().len(), 2);
    assert!(dir.path().join("ring.graph").exists());
}

// ── Config Roundtrip ───────────────────────────────────────────

#[test]
fn test_config_toml_roundtrip() {
    let c = config(2);
    let back = PlannerConfig::from_toml(&c.to_toml().unwrap()).unwrap();
    assert_eq!(back, c);
    back.validate().unwrap();
}
