// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-server sub-topologies with tunnelled cross-server edges.
//!
//! Every undirected edge is visited once, as `(u, v)` with `u < v`. An edge
//! inside one server is kept as an intra edge. An edge between servers gets
//! a fresh tunnel id and one dangling record on each side:
//!
//! ```text
//! server(u):  u v_external_<server(v)>_<tunnel>
//! server(v):  v u_external_<server(u)>_<tunnel>
//! ```
//!
//! Tunnel ids start at [`FIRST_TUNNEL_ID`] and grow by one per cross edge
//! in edge order. The counter lives for one materialization pass only.
//!
//! # File format
//!
//! Line 1 lists the server's nodes; then one intra edge per line; then one
//! dangling record per line. Nothing separates the two edge blocks: a
//! dangling record is recognised by the `_external_` token in its second
//! field.

use crate::PlannerError;
use std::fmt;
use std::path::{Path, PathBuf};
use topo_graph::{graph::Validated, Graph, NodeId};
use topo_partition::{Assignment, ServerId};
use tracing::{debug, info};

/// First tunnel id; lower ids are reserved.
pub const FIRST_TUNNEL_ID: u32 = 4097;

const EXTERNAL_TOKEN: &str = "_external_";

/// Hands out tunnel ids for one materialization pass.
#[derive(Debug)]
pub struct TunnelAllocator {
    next: u32,
}

impl TunnelAllocator {
    pub fn new() -> Self {
        Self {
            next: FIRST_TUNNEL_ID,
        }
    }

    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> usize {
        (self.next - FIRST_TUNNEL_ID) as usize
    }
}

impl Default for TunnelAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// One endpoint's view of a tunnelled edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingEdge {
    pub local: NodeId,
    pub remote: NodeId,
    pub remote_server: ServerId,
    pub tunnel: u32,
}

impl DanglingEdge {
    /// The `<remote>_external_<server>_<tunnel>` descriptor.
    pub fn descriptor(&self) -> String {
        format!(
            "{}{EXTERNAL_TOKEN}{}_{}",
            self.remote, self.remote_server, self.tunnel
        )
    }

    fn parse_descriptor(local: &str, descriptor: &str) -> Option<Self> {
        // Split from the right: remote ids may contain underscores.
        let (remote, rest) = descriptor.rsplit_once(EXTERNAL_TOKEN)?;
        let (server, tunnel) = rest.split_once('_')?;
        Some(Self {
            local: local.to_string(),
            remote: remote.to_string(),
            remote_server: server.parse().ok()?,
            tunnel: tunnel.parse().ok()?,
        })
    }
}

impl fmt::Display for DanglingEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.local, self.descriptor())
    }
}

/// The part of the topology one server runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTopology {
    pub server: ServerId,
    /// Owned nodes in topology load order.
    pub nodes: Vec<NodeId>,
    pub edges: Vec<(NodeId, NodeId)>,
    pub dangling: Vec<DanglingEdge>,
}

impl SubTopology {
    fn empty(server: ServerId) -> Self {
        Self {
            server,
            nodes: Vec::new(),
            edges: Vec::new(),
            dangling: Vec::new(),
        }
    }

    /// Tunnel ids referenced by this server, in record order.
    pub fn tunnels(&self) -> impl Iterator<Item = u32> + '_ {
        self.dangling.iter().map(|d| d.tunnel)
    }

    /// Renders the sub-topology in the topology text format.
    pub fn render(&self) -> String {
        let mut out = self.nodes.join(" ");
        out.push('\n');
        for (u, v) in &self.edges {
            out.push_str(&format!("{u} {v}\n"));
        }
        for d in &self.dangling {
            out.push_str(&format!("{d}\n"));
        }
        out
    }

    /// Parses a rendered sub-topology back.
    pub fn parse(server: ServerId, content: &str) -> Result<Self, PlannerError> {
        let mut lines = content.lines().enumerate();
        let nodes = lines
            .next()
            .map(|(_, l)| l.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let mut sub = Self {
            nodes,
            ..Self::empty(server)
        };

        for (idx, line) in lines {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            let &[local, other] = tokens.as_slice() else {
                return Err(PlannerError::SubTopology {
                    line: idx + 1,
                    detail: format!("expected 2 tokens, found {}", tokens.len()),
                });
            };
            if other.contains(EXTERNAL_TOKEN) {
                let edge = DanglingEdge::parse_descriptor(local, other).ok_or_else(|| {
                    PlannerError::SubTopology {
                        line: idx + 1,
                        detail: format!("malformed dangling descriptor '{other}'"),
                    }
                })?;
                sub.dangling.push(edge);
            } else {
                sub.edges.push((local.to_string(), other.to_string()));
            }
        }
        Ok(sub)
    }

    pub fn write(&self, path: &Path) -> Result<(), PlannerError> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

/// File name for server `server`'s sub-topology: `<stem>.sub<i>.<ext>`.
pub fn sub_topology_file_name(topology: &Path, server: ServerId) -> PathBuf {
    let stem = topology
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "topology".to_string());
    let name = match topology.extension() {
        Some(ext) => format!("{stem}.sub{server}.{}", ext.to_string_lossy()),
        None => format!("{stem}.sub{server}"),
    };
    PathBuf::from(name)
}

/// Builds one [`SubTopology`] per server in `0..server_count`.
///
/// # Errors
/// [`PlannerError::Partition`] if `server_of` misses a node or names a
/// server outside `0..server_count`.
pub fn materialize(
    graph: &Graph<Validated>,
    server_of: &Assignment,
    server_count: usize,
) -> Result<Vec<SubTopology>, PlannerError> {
    server_of.validate(graph, server_count)?;

    let mut subs: Vec<SubTopology> = (0..server_count).map(SubTopology::empty).collect();
    for node in graph.nodes() {
        if let Some(server) = server_of.get(node) {
            subs[server].nodes.push(node.clone());
        }
    }

    let mut tunnels = TunnelAllocator::new();
    scan_edges(graph, server_of, &mut subs, &mut tunnels);

    info!(
        "materialized {server_count} sub-topologies with {} tunnel(s)",
        tunnels.allocated()
    );
    Ok(subs)
}

fn scan_edges(
    graph: &Graph<Validated>,
    server_of: &Assignment,
    subs: &mut [SubTopology],
    tunnels: &mut TunnelAllocator,
) {
    for (u, v) in graph.edges() {
        let (Some(su), Some(sv)) = (server_of.get(u), server_of.get(v)) else {
            continue;
        };
        if su == sv {
            subs[su].edges.push((u.clone(), v.clone()));
            continue;
        }
        let tunnel = tunnels.allocate();
        debug!("tunnel {tunnel}: {u}@{su} <-> {v}@{sv}");
        subs[su].dangling.push(DanglingEdge {
            local: u.clone(),
            remote: v.clone(),
            remote_server: sv,
            tunnel,
        });
        subs[sv].dangling.push(DanglingEdge {
            local: v.clone(),
            remote: u.clone(),
            remote_server: su,
            tunnel,
        });
    }
}
