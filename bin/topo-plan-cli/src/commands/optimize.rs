// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `topo-plan optimize` command: PM split plus VM sizing, nothing written.

use std::path::PathBuf;

use planner::Planner;

pub async fn execute(config: Option<PathBuf>, strategy: Option<String>) -> anyhow::Result<()> {
    super::banner("Resource Allocation");

    let config = super::load_config(config.as_deref(), strategy)?;
    let allocated = Planner::new(config)
        .load()?
        .partition_pms()
        .await?
        .allocate()
        .await?;

    let partition = allocated.pm_partition();
    println!(
        "  {:<4} {:>7} {:>7} {:>14} {:>10} {:>8}",
        "PM", "Nodes", "Edges", "(n, m, vcpu)", "Gain", "Legal",
    );
    println!("  {}", "-".repeat(56));

    for (pm, allocation) in allocated.allocations() {
        let gain = allocation
            .search
            .optimal_gain
            .map(|g| format!("{g:.2}"))
            .unwrap_or_else(|| "default".into());
        println!(
            "  {:<4} {:>7} {:>7} {:>14} {:>10} {:>8}",
            pm,
            partition.node_count(*pm),
            partition.edge_count(*pm),
            allocation.search.optimum.to_string(),
            gain,
            if allocation.legal { "yes" } else { "NO" },
        );
    }
    println!();

    if allocated.is_legal() {
        println!("  All allocations fit their PMs.");
    } else {
        println!(
            "  PM(s) {:?} need more VMs than they can host.",
            allocated.illegal_pms()
        );
    }
    println!();
    Ok(())
}
