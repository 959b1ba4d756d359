// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `topo-plan inspect` command: topology statistics.
//!
//! Loads and validates the topology, then prints its size and a degree
//! histogram.

use std::collections::BTreeMap;
use std::path::PathBuf;

use topo_graph::TopoLoader;

pub async fn execute(topology: PathBuf) -> anyhow::Result<()> {
    super::banner("Topology Inspector");

    let graph = TopoLoader::load(&topology).map_err(|e| {
        anyhow::anyhow!("failed to load topology from '{}': {e}", topology.display())
    })?;

    // ── Summary ────────────────────────────────────────────────
    println!("  Topology: {}", topology.display());
    println!("  Nodes:    {}", graph.node_count());
    println!("  Edges:    {}", graph.edge_count());
    println!("  Degree:   avg {:.2}, max {}", graph.average_degree(), graph.max_degree());
    println!();

    // ── Degree Histogram ───────────────────────────────────────
    let mut histogram: BTreeMap<usize, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *histogram.entry(graph.degree(node)).or_default() += 1;
    }

    println!("  {:<8} {:>8}", "Degree", "Nodes");
    println!("  {}", "-".repeat(17));
    for (degree, count) in &histogram {
        println!("  {degree:<8} {count:>8}");
    }
    println!();
    Ok(())
}
