// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Compare PM strategies on a synthetic grid topology.
//!
//! Random placement cuts far more links than the multilevel partitioner,
//! which shows up directly in the cross-PM edge count and the TDF.
//!
//! ```bash
//! cargo run -p planner --example strategy_comparison
//! ```

use planner::{Planner, PlannerConfig};
use std::collections::BTreeMap;
use topo_graph::{graph::Validated, Graph, TopoLoader};
use vm_allocator::{PmConfig, ThetaTable};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let graph = build_grid(16, 16)?;
    println!("Topology: {}\n", graph.summary());

    println!(
        "{:<12} {:>5} {:>12} {:>9} {:>10} {:>10}",
        "Strategy", "PMs", "Cross edges", "Servers", "Tunnels", "TDF",
    );
    println!("{}", "-".repeat(64));

    let rt = tokio::runtime::Runtime::new()?;
    for strategy in ["naive", "multilevel"] {
        for pm_count in [2, 4, 8] {
            let config = config(strategy, pm_count)?;
            let output = rt.block_on(async {
                Planner::from_graph(config, graph.clone())
                    .partition_pms()
                    .await?
                    .allocate()
                    .await?
                    .partition_vms()
                    .await?
                    .materialize()
            })?;
            let m = &output.metrics;
            println!(
                "{:<12} {:>5} {:>12} {:>9} {:>10} {:>10.4}",
                strategy, pm_count, m.cross_pm_edges, m.server_count, m.tunnel_count, m.tdf,
            );
        }
    }

    Ok(())
}

fn config(strategy: &str, pm_count: usize) -> Result<PlannerConfig, vm_allocator::AllocError> {
    let pm = PmConfig {
        core_count: 8,
        memory_gb: 128,
        max_vm_count: 8,
        x: 0.001,
        y: 0.0005,
        z: 0.01,
        theta: ThetaTable::new(BTreeMap::from([(8, 0.9), (16, 1.4), (32, 2.2)]))?,
    };
    Ok(PlannerConfig {
        topology: "<synthetic>".into(),
        strategy: strategy.into(),
        pms: vec![pm; pm_count],
        ..Default::default()
    })
}

fn build_grid(rows: usize, cols: usize) -> Result<Graph<Validated>, topo_graph::TopoError> {
    let name = |r: usize, c: usize| format!("s{r}_{c}");
    let mut nodes = Vec::new();
    let mut text = String::new();
    for r in 0..rows {
        for c in 0..cols {
            nodes.push(name(r, c));
            if c + 1 < cols {
                text.push_str(&format!("{} {}\n", name(r, c), name(r, c + 1)));
            }
            if r + 1 < rows {
                text.push_str(&format!("{} {}\n", name(r, c), name(r + 1, c)));
            }
        }
    }
    TopoLoader::parse(&format!("{}\n{text}", nodes.join(" ")))
}
