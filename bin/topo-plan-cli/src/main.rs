// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # topo-plan
//!
//! Command-line interface for the hierarchical topology placement planner.
//!
//! ## Usage
//! ```bash
//! # Full pipeline: PM split, VM sizing, VM split, tunnels, TDF
//! topo-plan -c plan.toml plan
//!
//! # PM-level split only
//! topo-plan partition --topology ./topo/grid_10_10.txt --pms 4 --strategy naive
//!
//! # PM split + resource allocation, no files written
//! topo-plan -c plan.toml optimize
//!
//! # Graph statistics
//! topo-plan inspect --topology ./topo/grid_10_10.txt
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "topo-plan",
    about = "Partition emulated network topologies across PMs and VMs",
    version,
    author
)]
struct Cli {
    /// Path to a TOML (or `.json`) planning configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full planning pipeline and write its outputs.
    Plan {
        /// PM strategy override: naive, multilevel, external-solver.
        #[arg(short, long)]
        strategy: Option<String>,

        /// Keep going when a PM needs more VMs than it can host.
        #[arg(long)]
        allow_illegal: bool,
    },

    /// Split a topology across physical machines only.
    Partition {
        /// Path to the topology file.
        #[arg(short, long)]
        topology: PathBuf,

        /// Number of physical machines.
        #[arg(short, long)]
        pms: usize,

        /// PM strategy: naive, multilevel, external-solver.
        #[arg(short, long, default_value = "multilevel")]
        strategy: String,
    },

    /// Split across PMs and size the VMs of each PM.
    Optimize {
        /// PM strategy override.
        #[arg(short, long)]
        strategy: Option<String>,
    },

    /// Print node, edge and degree statistics of a topology.
    Inspect {
        /// Path to the topology file.
        #[arg(short, long)]
        topology: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Plan {
            strategy,
            allow_illegal,
        } => commands::plan::execute(cli.config, strategy, allow_illegal).await,
        Commands::Partition {
            topology,
            pms,
            strategy,
        } => commands::partition::execute(cli.config, topology, pms, strategy).await,
        Commands::Optimize { strategy } => commands::optimize::execute(cli.config, strategy).await,
        Commands::Inspect { topology } => commands::inspect::execute(topology).await,
    }
}
