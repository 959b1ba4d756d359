// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # topo-graph
//!
//! The undirected topology graph shared by every stage of the placement
//! planner.
//!
//! - [`Graph`] — ordered node list plus symmetric adjacency, with a
//!   **type-state pattern** (`Parsed` → `Validated`).
//! - [`TopoLoader`] — reads the two-section topology text format.
//!
//! # Topology Format
//! ```text
//! r0 r1 r2 r3          <- line 1: whitespace-separated node ids
//! r0 r1                <- one undirected edge per line
//! r1 r2
//! r2 r3
//! ```
//!
//! Nodes that end up with no neighbours are dropped while loading.
//!
//! # Example
//! ```no_run
//! use topo_graph::TopoLoader;
//! use std::path::Path;
//!
//! let graph = TopoLoader::load(Path::new("./topo/grid_10_10.txt")).unwrap();
//! println!("{}", graph.summary());
//! for (u, v) in graph.edges() {
//!     println!("  {u} -- {v}");
//! }
//! ```

mod error;
pub mod graph;
mod loader;

pub use error::TopoError;
pub use graph::{Graph, NodeId};
pub use loader::TopoLoader;
