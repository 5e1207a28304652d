/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The read-only topology and catalog oracle consumed by every strategy.
//!
//! `View` and `Topology` are trait interfaces, not concrete types: the
//! harness that owns the simulated network implements them. This crate only
//! ever holds `&dyn View`.

use crate::compute_spot::ComputeSpot;
use crate::ids::{NodeId, ServiceId, SimTime};
use crate::service::Service;

/// Per-node placement in the topology, consulted by the coordinated
/// strategy's depth-ordered replacement pass.
pub trait Topology {
    /// Client-side nodes that originate requests.
    fn receivers(&self) -> Vec<NodeId>;
    /// Distance (in hops) from the topology root to `node`.
    fn depth(&self, node: NodeId) -> u32;
    /// Maximum depth of any node in the topology.
    fn height(&self) -> u32;
}

/// Read-only topology and catalog oracle.
pub trait View {
    /// The node hosting the origin (non-cached) copy of `service`.
    fn content_source(&self, service: ServiceId) -> NodeId;
    /// Hop sequence from `a` to `b`, inclusive of both endpoints.
    fn shortest_path(&self, a: NodeId, b: NodeId) -> Vec<NodeId>;
    /// Cumulative propagation delay along the shortest path from `a` to `b`.
    fn path_delay(&self, a: NodeId, b: NodeId) -> SimTime;
    /// Propagation delay of the single link between adjacent nodes `a`, `b`.
    fn link_delay(&self, a: NodeId, b: NodeId) -> SimTime;
    /// The full service catalog, indexed by [`ServiceId`].
    fn services(&self) -> &[Service];
    fn num_services(&self) -> usize;
    /// Whether `node` hosts a [`ComputeSpot`] at all.
    fn has_computational_spot(&self, node: NodeId) -> bool;
    /// Whether `node`'s compute spot currently has a resident VM for
    /// `service`.
    fn has_service(&self, node: NodeId, service: ServiceId) -> bool;
    fn comp_spot(&self, node: NodeId) -> &ComputeSpot;
    fn comp_spot_mut(&mut self, node: NodeId) -> &mut ComputeSpot;
    /// Every node that hosts a compute spot, in deterministic order.
    fn service_nodes(&self) -> Vec<NodeId>;
    fn topology(&self) -> &dyn Topology;
}
