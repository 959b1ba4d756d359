// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod inspect;
pub mod optimize;
pub mod partition;
pub mod plan;

use anyhow::Context;
use planner::PlannerConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the planning configuration, applying a strategy override.
pub fn load_config(path: Option<&Path>, strategy: Option<String>) -> anyhow::Result<PlannerConfig> {
    let path = path.context("this command needs a configuration file (-c <file>)")?;
    let mut config = PlannerConfig::from_file(path)
        .with_context(|| format!("failed to load config '{}'", path.display()))?;
    if let Some(strategy) = strategy {
        config.strategy = strategy;
    }
    Ok(config)
}

fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", format!("topo-plan · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}
