// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `topo-plan plan` command: run the whole pipeline.
//!
//! ```text
//! Planner<Idle> → load → partition_pms → allocate → partition_vms → materialize
//! ```

use std::path::PathBuf;

use planner::Planner;

pub async fn execute(
    config: Option<PathBuf>,
    strategy: Option<String>,
    allow_illegal: bool,
) -> anyhow::Result<()> {
    super::banner("Placement Planner");

    let config = super::load_config(config.as_deref(), strategy)?;
    let output_dir = config.output_dir.clone();

    println!("  Config:");
    println!("   Topology: {}", config.topology.display());
    println!("   Strategy: {}", config.strategy);
    println!("   PMs:      {}", config.pm_count());
    println!("   Output:   {}", output_dir.display());
    println!();

    println!("  [1/5] Loading topology...");
    let loaded = Planner::new(config).load()?;
    println!("        {}", loaded.graph().summary());

    println!("  [2/5] Partitioning across PMs...");
    let partitioned = loaded.partition_pms().await?;
    println!("        {}", partitioned.pm_partition().summary());

    println!("  [3/5] Optimizing VM allocations...");
    let allocated = partitioned.allocate().await?;
    for (pm, allocation) in allocated.allocations() {
        println!(
            "        PM {pm}: {}{}",
            allocation.search.optimum,
            if allocation.legal { "" } else { "  (ILLEGAL)" },
        );
    }
    if !allocated.is_legal() {
        let pms = allocated.illegal_pms();
        if !allow_illegal {
            anyhow::bail!(
                "PM(s) {pms:?} need more VMs than they can host; \
                 rerun with --allow-illegal to continue anyway"
            );
        }
        tracing::warn!("continuing with illegal allocations on PM(s) {pms:?}");
    }

    println!("  [4/5] Partitioning across VMs...");
    let vm_partitioned = allocated.partition_vms().await?;

    println!("  [5/5] Materializing sub-topologies...");
    let output = vm_partitioned.materialize()?;
    output.write_to(&output_dir)?;

    println!();
    println!("  {}", output.metrics.summary());
    println!("  TDF: {}", output.tdf);
    println!("  Wrote {} sub-topologies to {}", output.sub_topologies.len(), output_dir.display());
    println!();
    Ok(())
}
