/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The mutating side of the simulator consumed by strategies: session
//! bookkeeping, follow-up event emission, and VM/cache reassignment
//! recording.

use crate::event::StatusCode;
use crate::ids::{FlowId, NodeId, ServiceId, SimTime};

/// Mutating collaborator every strategy drives via a narrow, explicit API.
pub trait Controller {
    fn start_session(&mut self, time: SimTime, receiver: NodeId, service: ServiceId, log: bool, flow_id: FlowId, deadline: SimTime);
    fn end_session(&mut self, successful: bool, time: SimTime, flow_id: FlowId);
    #[allow(clippy::too_many_arguments)]
    fn add_event(&mut self, time: SimTime, receiver: NodeId, service: ServiceId, node: NodeId, flow_id: FlowId, deadline: SimTime, rtt_delay: SimTime, status: StatusCode);
    fn execute_service(&mut self, flow_id: FlowId, service: ServiceId, node: NodeId, time: SimTime, is_cloud: bool);
    fn replacement_interval_over(&mut self, flow_id: FlowId, interval: SimTime, time: SimTime);

    /// Install `service` at `node`'s cache, evicting and returning the
    /// least-recently-used resident service (if the cache was full).
    fn put_content(&mut self, node: NodeId, service: ServiceId) -> Option<ServiceId>;
    /// Mark `service` at `node` as recently used.
    fn get_content(&mut self, node: NodeId, service: ServiceId);

    /// Record a VM reassignment: `from_service` (if any) is evicted and each
    /// entry in `to_services` gains one VM. The coordinated strategy passes
    /// multiple additions per call; every other strategy passes one.
    fn reassign_vm(&mut self, node: NodeId, from_service: Option<ServiceId>, to_services: &[ServiceId]);
}
