// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Splitting one PM's subgraph across its VMs.
//!
//! Servers are numbered globally: PM `p`'s VMs occupy the contiguous range
//! `offset(p) .. offset(p) + vm_count(p)`, with offsets accumulated over
//! PMs in ascending id order.

use crate::pm::PmId;
use crate::strategy::{Multilevel, Partitioner};
use crate::{Assignment, PartitionError, PartitionId};
use std::collections::BTreeMap;
use topo_graph::{graph::Validated, Graph};

/// Global index of a server (one VM on one PM).
pub type ServerId = PartitionId;

/// First global server id of every PM.
pub fn server_offsets(vm_counts: &BTreeMap<PmId, usize>) -> BTreeMap<PmId, ServerId> {
    let mut next = 0;
    vm_counts
        .iter()
        .map(|(&pm, &count)| {
            let offset = next;
            next += count;
            (pm, offset)
        })
        .collect()
}

/// Total number of servers.
pub fn total_servers(vm_counts: &BTreeMap<PmId, usize>) -> usize {
    vm_counts.values().sum()
}

/// The PM owning each global server id.
pub fn server_to_pm(vm_counts: &BTreeMap<PmId, usize>) -> BTreeMap<ServerId, PmId> {
    let offsets = server_offsets(vm_counts);
    vm_counts
        .iter()
        .flat_map(|(pm, &count)| {
            let base = offsets[pm];
            (base..base + count).map(move |server| (server, *pm))
        })
        .collect()
}

/// Assigns every node of `pm_graph` to a global server id in
/// `server_offset .. server_offset + vm_count`.
///
/// A single VM takes everything without running the partitioner.
pub fn partition_across_vms(
    partitioner: &Multilevel,
    pm_graph: &Graph<Validated>,
    vm_count: usize,
    server_offset: ServerId,
) -> Result<Assignment, PartitionError> {
    if vm_count == 0 {
        return Err(PartitionError::InvalidPartitionCount(vm_count));
    }
    if vm_count == 1 {
        return Ok(Assignment::uniform(pm_graph, server_offset));
    }
    let local = partitioner.partition(pm_graph, vm_count)?;
    Ok(local.offset(server_offset))
}
