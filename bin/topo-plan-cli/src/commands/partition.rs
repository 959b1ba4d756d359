// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `topo-plan partition` command: PM-level split only.

use std::path::PathBuf;

use anyhow::Context;
use planner::PlannerConfig;
use topo_graph::TopoLoader;
use topo_partition::partition_across_pms;

pub async fn execute(
    config: Option<PathBuf>,
    topology: PathBuf,
    pms: usize,
    strategy: String,
) -> anyhow::Result<()> {
    super::banner("PM Partitioner");

    // The config file only contributes multilevel and solver settings here.
    let mut config = match config {
        Some(path) => PlannerConfig::from_file(&path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => PlannerConfig::default(),
    };
    config.topology = topology;
    config.strategy = strategy;
    let strategy = config.create_strategy()?;

    let graph = TopoLoader::load(&config.topology).with_context(|| {
        format!("failed to load topology '{}'", config.topology.display())
    })?;
    println!("  {}", graph.summary());
    println!("  Strategy: {}, PMs: {pms}", strategy.kind());
    println!();

    let partition = tokio::task::spawn_blocking(move || {
        partition_across_pms(&strategy, &graph, pms)
    })
    .await
    .context("partitioning task failed")??;

    println!("  {:<6} {:>10} {:>10}", "PM", "Nodes", "Edges");
    println!("  {}", "-".repeat(28));
    for pm in 0..partition.pm_count() {
        println!(
            "  {:<6} {:>10} {:>10}",
            pm,
            partition.node_count(pm),
            partition.edge_count(pm),
        );
    }
    println!();
    println!("  Cross-PM edges: {}", partition.cross_pm_edges().len());
    println!();
    Ok(())
}
