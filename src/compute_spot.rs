/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! A node's compute capacity: a fixed VM pool, a service-instance count
//! vector, a [`TaskScheduler`], and an `admit_task` policy gating on VM
//! residency.

use std::collections::BTreeMap;

use tracing::info;

use crate::controller::Controller;
use crate::event::StatusCode;
use crate::ids::{FlowId, NodeId, ServiceId, SimTime};
use crate::scheduler::TaskScheduler;
use crate::service::Service;
use crate::task::AdmissionReason;

/// Per-node compute capacity and VM placement state.
///
/// `service_instances` uses a `BTreeMap` rather than a dense `Vec` so the
/// same type works whether the catalog has ten services or ten thousand,
/// while keeping deterministic iteration order for replacement passes.
pub struct ComputeSpot {
    pub node_id: NodeId,
    pub is_cloud: bool,
    pub num_vms: u32,
    pub service_population_size: usize,
    pub service_instances: BTreeMap<ServiceId, u32>,
    pub running_requests: BTreeMap<ServiceId, u64>,
    pub missed_requests: BTreeMap<ServiceId, u64>,
    pub scheduler: TaskScheduler,
}

impl ComputeSpot {
    /// Construct an edge compute spot and seed its VM pool round-robin
    /// across the service catalog: `vm_index mod service_population_size`.
    pub fn new_edge(
        node_id: NodeId,
        num_cores: usize,
        num_vms: u32,
        service_population_size: usize,
    ) -> Self {
        let mut service_instances = BTreeMap::new();
        for vm in 0..num_vms {
            let service = ServiceId(vm as usize % service_population_size);
            *service_instances.entry(service).or_insert(0u32) += 1;
        }
        info!(node = node_id.0, vms = num_vms, services = service_population_size, "compute spot initialised");
        ComputeSpot {
            node_id,
            is_cloud: false,
            num_vms,
            service_population_size,
            service_instances,
            running_requests: BTreeMap::new(),
            missed_requests: BTreeMap::new(),
            scheduler: TaskScheduler::new(num_cores),
        }
    }

    /// Construct the cloud compute spot: unbounded capacity, every service
    /// is always resident.
    pub fn new_cloud(node_id: NodeId) -> Self {
        ComputeSpot {
            node_id,
            is_cloud: true,
            num_vms: 0,
            service_population_size: 0,
            service_instances: BTreeMap::new(),
            running_requests: BTreeMap::new(),
            missed_requests: BTreeMap::new(),
            scheduler: TaskScheduler::cloud(),
        }
    }

    pub fn has_service(&self, service: ServiceId) -> bool {
        self.is_cloud || self.service_instances.get(&service).copied().unwrap_or(0) > 0
    }

    pub fn instance_total(&self) -> u32 {
        self.service_instances.values().sum()
    }

    /// Admit a request for `service`, verifying VM residency first.
    ///
    /// Tracks per-service `running_requests`/`missed_requests` counters
    /// consulted by the usage-ranked replacement passes (HYBRID, MFU, SDF).
    /// On success, immediately reports the admitted task's completion back
    /// to `controller` as a `TASK_COMPLETE` event and an `execute_service`
    /// call — there is no separate dispatch step for a task's first run.
    #[allow(clippy::too_many_arguments)]
    pub fn admit_task(
        &mut self,
        service: &Service,
        time: SimTime,
        flow_id: FlowId,
        deadline: SimTime,
        receiver: NodeId,
        rtt_delay: SimTime,
        path_delay_to_receiver: SimTime,
        controller: &mut dyn Controller,
    ) -> (bool, AdmissionReason) {
        if !self.has_service(service.service_id) {
            *self.missed_requests.entry(service.service_id).or_insert(0) += 1;
            return (false, AdmissionReason::NoInstances);
        }
        let (ok, reason) = self.scheduler.admit_task(
            service,
            time,
            flow_id,
            deadline,
            receiver,
            rtt_delay,
            self.node_id,
            path_delay_to_receiver,
        );
        if ok {
            *self.running_requests.entry(service.service_id).or_insert(0) += 1;
            // Admission already finalised this task's completion time against
            // the core it landed on, so there is nothing left to wait for —
            // report it now rather than leaving it for a later `schedule()`
            // call to rediscover.
            if let Some(task) = self.scheduler.task_queue.pop_back() {
                controller.add_event(
                    task.completion_time,
                    task.receiver,
                    task.service_id,
                    self.node_id,
                    task.flow_id,
                    task.expiry,
                    task.rtt_delay,
                    StatusCode::TaskComplete,
                );
                controller.execute_service(task.flow_id, task.service_id, self.node_id, time, self.is_cloud);
            }
        } else {
            *self.missed_requests.entry(service.service_id).or_insert(0) += 1;
        }
        (ok, reason)
    }

    /// Move one VM slot from `from_service` (if any) to `to_service`,
    /// preserving the total VM count, and report the change to the
    /// controller.
    pub fn reassign_vm(
        &mut self,
        controller: &mut dyn Controller,
        from_service: Option<ServiceId>,
        to_service: ServiceId,
    ) {
        if let Some(from) = from_service {
            if let Some(count) = self.service_instances.get_mut(&from) {
                *count = count.saturating_sub(1);
            }
        }
        *self.service_instances.entry(to_service).or_insert(0) += 1;
        controller.reassign_vm(self.node_id, from_service, &[to_service]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingController {
        task_completes: Vec<(SimTime, FlowId)>,
    }

    impl Controller for RecordingController {
        fn start_session(&mut self, _time: SimTime, _receiver: NodeId, _service: ServiceId, _log: bool, _flow_id: FlowId, _deadline: SimTime) {}
        fn end_session(&mut self, _successful: bool, _time: SimTime, _flow_id: FlowId) {}
        fn add_event(&mut self, time: SimTime, _receiver: NodeId, _service: ServiceId, _node: NodeId, flow_id: FlowId, _deadline: SimTime, _rtt_delay: SimTime, _status: StatusCode) {
            self.task_completes.push((time, flow_id));
        }
        fn execute_service(&mut self, _flow_id: FlowId, _service: ServiceId, _node: NodeId, _time: SimTime, _is_cloud: bool) {}
        fn replacement_interval_over(&mut self, _flow_id: FlowId, _interval: SimTime, _time: SimTime) {}
        fn put_content(&mut self, _node: NodeId, _service: ServiceId) -> Option<ServiceId> {
            None
        }
        fn get_content(&mut self, _node: NodeId, _service: ServiceId) {}
        fn reassign_vm(&mut self, _node: NodeId, _from_service: Option<ServiceId>, _to_services: &[ServiceId]) {}
    }

    #[test]
    fn round_robin_placement_distributes_vms_evenly() {
        let cs = ComputeSpot::new_edge(NodeId(1), 2, 4, 2);
        assert_eq!(cs.service_instances.get(&ServiceId(0)), Some(&2));
        assert_eq!(cs.service_instances.get(&ServiceId(1)), Some(&2));
        assert_eq!(cs.instance_total(), 4);
    }

    #[test]
    fn cloud_has_every_service() {
        let cs = ComputeSpot::new_cloud(NodeId(0));
        assert!(cs.has_service(ServiceId(42)));
    }

    #[test]
    fn edge_without_instance_reports_no_instances() {
        let mut cs = ComputeSpot::new_edge(NodeId(1), 1, 1, 2);
        let svc = Service { service_id: ServiceId(1), service_time: 1.0, deadline: 10.0 };
        let mut controller = RecordingController::default();
        let (ok, reason) = cs.admit_task(&svc, 0.0, 1, 10.0, NodeId(0), 0.0, 0.0, &mut controller);
        assert!(!ok);
        assert_eq!(reason, AdmissionReason::NoInstances);
        assert!(controller.task_completes.is_empty());
    }

    #[test]
    fn admitted_task_immediately_reports_its_own_completion() {
        let mut cs = ComputeSpot::new_edge(NodeId(1), 1, 1, 1);
        let svc = Service { service_id: ServiceId(0), service_time: 2.0, deadline: 10.0 };
        let mut controller = RecordingController::default();
        let (ok, reason) = cs.admit_task(&svc, 0.0, 7, 10.0, NodeId(0), 0.0, 0.0, &mut controller);
        assert!(ok);
        assert_eq!(reason, AdmissionReason::Success);
        assert_eq!(controller.task_completes, vec![(2.0, 7)]);
        assert_eq!(cs.running_requests.get(&ServiceId(0)), Some(&1));
    }
}
