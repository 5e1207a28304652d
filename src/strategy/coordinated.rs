/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Global-knowledge placement: routes each request to the farthest upstream
//! compute spot that can still meet its deadline, and periodically
//! re-instantiates VMs depth-first from accumulated per-node demand.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::StrategyConfig;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::event::{Event, StatusCode};
use crate::ids::{FlowId, NodeId, ServiceId, SimTime};
use crate::task::Task;
use crate::view::View;

use super::Strategy;

pub struct Coordinated {
    last_replacement: SimTime,
    replacement_interval: SimTime,
    debug: bool,
    /// `[receiver][node]` accumulated service-time demand per service,
    /// reset every replacement interval.
    service_node_util: BTreeMap<NodeId, BTreeMap<NodeId, Vec<f64>>>,
    /// VM counts from the previous replacement pass, diffed against the new
    /// placement to report additions/evictions.
    num_vms_per_service: BTreeMap<NodeId, Vec<u32>>,
}

fn util_slot<'a>(
    map: &'a mut BTreeMap<NodeId, BTreeMap<NodeId, Vec<f64>>>,
    recv: NodeId,
    node: NodeId,
    num_services: usize,
) -> &'a mut Vec<f64> {
    map.entry(recv)
        .or_insert_with(BTreeMap::new)
        .entry(node)
        .or_insert_with(|| vec![0.0; num_services])
}

impl Coordinated {
    pub fn new(config: &StrategyConfig) -> Self {
        Coordinated {
            last_replacement: 0.0,
            replacement_interval: config.replacement_interval,
            debug: config.debug,
            service_node_util: BTreeMap::new(),
            num_vms_per_service: BTreeMap::new(),
        }
    }

    fn initialise_metrics(&mut self, view: &mut dyn View) {
        for &node in &view.service_nodes() {
            if view.comp_spot(node).is_cloud {
                continue;
            }
            view.comp_spot_mut(node).scheduler.idle_time = 0.0;
        }
        self.service_node_util.clear();
    }

    /// Walk the path from `receiver` to the content source, from the
    /// source end inward, and return the farthest node whose compute spot
    /// can admit the request without violating any already-queued task's
    /// deadline. Falls back to the content source itself.
    #[allow(clippy::too_many_arguments)]
    fn find_topmost_feasible_node(
        &self,
        view: &mut dyn View,
        receiver: NodeId,
        flow_id: FlowId,
        path: &[NodeId],
        time: SimTime,
        service: ServiceId,
        deadline: SimTime,
        rtt_delay: SimTime,
    ) -> NodeId {
        let source = view.content_source(service);
        if path.len() <= 2 {
            return source;
        }
        for &n in path[1..path.len() - 1].iter().rev() {
            if view.comp_spot(n).is_cloud || !view.has_service(n, service) {
                continue;
            }
            let delay = view.path_delay(receiver, n);
            let rtt_to_cs = rtt_delay + 2.0 * delay;
            let service_time = view.services()[service.index()].service_time;
            if deadline - time - rtt_to_cs < service_time {
                continue;
            }
            let task = Task::new(time, deadline, rtt_to_cs, n, service, service_time, flow_id, receiver, time + delay);
            let compspot = view.comp_spot_mut(n);
            compspot.scheduler.insert_upcoming(task);
            compspot.scheduler.compute_completion_times(time);
            let queued: Vec<(NodeId, SimTime, SimTime)> = compspot
                .scheduler
                .task_queue
                .iter()
                .chain(compspot.scheduler.upcoming_task_queue.iter())
                .map(|t| (t.receiver, t.expiry, t.completion_time))
                .collect();
            // Each queued task's own deadline bound depends on the path delay
            // from *its* receiver to this node, not the current probe's.
            let violated = queued
                .iter()
                .any(|&(task_receiver, expiry, completion_time)| (expiry - view.path_delay(task_receiver, n)) < completion_time);
            if violated {
                view.comp_spot_mut(n).scheduler.remove_upcoming(flow_id);
                continue;
            }
            return n;
        }
        source
    }

    fn clear_util_along_path(&mut self, view: &dyn View, receiver: NodeId, node: NodeId, service: ServiceId) {
        let has_demand = self
            .service_node_util
            .get(&receiver)
            .and_then(|m| m.get(&node))
            .map(|v| v[service.index()] != 0.0)
            .unwrap_or(false);
        if !has_demand {
            return;
        }
        let path = view.shortest_path(receiver, node);
        if let Some(per_node) = self.service_node_util.get_mut(&receiver) {
            for &n in &path[1..] {
                if let Some(v) = per_node.get_mut(&n) {
                    v[service.index()] = 0.0;
                }
            }
        }
    }

    /// Re-instantiate VMs depth-first: at each depth, rank services by
    /// accumulated demand from receivers for which the deadline is still
    /// reachable, then greedily fill the node's VM budget.
    fn replace_services(&mut self, view: &mut dyn View, controller: &mut dyn Controller, time: SimTime) {
        let num_services = view.num_services();
        let height = view.topology().height();
        let receivers = view.topology().receivers();

        for h in 0..=height {
            let nodes: Vec<NodeId> = view
                .service_nodes()
                .into_iter()
                .filter(|&n| !view.comp_spot(n).is_cloud && view.topology().depth(n) == h)
                .collect();

            for &node in &nodes {
                let mut service_utils = vec![0.0f64; num_services];
                for &recv in &receivers {
                    let util = match self.service_node_util.get(&recv).and_then(|m| m.get(&node)) {
                        Some(u) => u,
                        None => continue,
                    };
                    for service in 0..num_services {
                        if util[service] == 0.0 {
                            continue;
                        }
                        let svc = view.services()[service];
                        let path_delay = view.path_delay(recv, node);
                        if svc.deadline > 2.0 * path_delay + svc.service_time {
                            service_utils[service] += util[service];
                        }
                    }
                }

                // No demand was observed anywhere on this node's receivers this
                // interval: leave its current placement untouched rather than
                // clearing it to nothing below, so a zero-traffic interval is a
                // no-op.
                if service_utils.iter().all(|&u| u == 0.0) {
                    continue;
                }

                let mut ranked: Vec<(usize, f64)> = service_utils.iter().copied().enumerate().collect();
                ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

                let num_vms = view.comp_spot(node).num_vms;
                let mut remaining = num_vms;
                let mut instances = vec![0u32; num_services];

                for &(service, util) in &ranked {
                    if remaining == 0 {
                        break;
                    }
                    let count = (util / self.replacement_interval).round();
                    let count = if count.is_sign_negative() { 0 } else { count as u32 };
                    if count > 0 {
                        for &recv in &receivers {
                            self.clear_util_along_path(view, recv, node, ServiceId(service));
                        }
                    }
                    let assign = count.min(remaining);
                    instances[service] = assign;
                    remaining -= assign;
                }

                'fill: while remaining > 0 {
                    let mut added = false;
                    for &(service, util) in &ranked {
                        if instances[service] > 0 {
                            instances[service] += 1;
                            remaining -= 1;
                            added = true;
                        } else {
                            let count = (util / self.replacement_interval).ceil();
                            let count = if count.is_sign_negative() { 0 } else { count as u32 };
                            let assign = count.min(remaining);
                            if assign > 0 {
                                instances[service] = assign;
                                remaining -= assign;
                                added = true;
                                for &recv in &receivers {
                                    self.clear_util_along_path(view, recv, node, ServiceId(service));
                                }
                            }
                        }
                        if remaining == 0 {
                            break 'fill;
                        }
                    }
                    if !added {
                        break;
                    }
                }

                let compspot = view.comp_spot_mut(node);
                compspot.service_instances.clear();
                for (service, &count) in instances.iter().enumerate() {
                    if count > 0 {
                        compspot.service_instances.insert(ServiceId(service), count);
                    }
                }
            }
        }

        for node in view.service_nodes() {
            if view.comp_spot(node).is_cloud {
                continue;
            }
            let current = view.comp_spot(node).service_instances.clone();
            let previous = self
                .num_vms_per_service
                .entry(node)
                .or_insert_with(|| vec![0u32; num_services])
                .clone();

            let mut to_add = Vec::new();
            let mut to_replace = Vec::new();
            let mut updated = previous.clone();
            for service in 0..num_services {
                let now = current.get(&ServiceId(service)).copied().unwrap_or(0);
                let before = previous.get(service).copied().unwrap_or(0);
                updated[service] = now;
                match now as i64 - before as i64 {
                    d if d > 0 => {
                        for _ in 0..d {
                            to_add.push(ServiceId(service));
                        }
                    }
                    d if d < 0 => {
                        for _ in 0..(-d) {
                            to_replace.push(ServiceId(service));
                        }
                    }
                    _ => {}
                }
            }
            self.num_vms_per_service.insert(node, updated);

            if !to_add.is_empty() {
                debug!(node = node.0, added = to_add.len(), evicted = to_replace.len(), "coordinated VM reassignment");
                controller.reassign_vm(node, to_replace.first().copied(), &to_add);
            }
        }
    }
}

impl Strategy for Coordinated {
    fn process_event(
        &mut self,
        view: &mut dyn View,
        controller: &mut dyn Controller,
        event: Event,
    ) -> Result<(), CoreError> {
        let Event { time, receiver, service, node, flow_id, deadline, mut rtt_delay, status } = event;
        let source = view.content_source(service);

        if super::replacement_due(self.last_replacement, self.replacement_interval, time) {
            controller.replacement_interval_over(flow_id, self.replacement_interval, time);
            self.replace_services(view, controller, time);
            self.last_replacement = time;
            self.initialise_metrics(view);
        }

        if receiver == node && status == StatusCode::Request {
            controller.start_session(time, receiver, service, self.debug, flow_id, deadline);
            let path = view.shortest_path(node, source);
            let upstream = self.find_topmost_feasible_node(view, receiver, flow_id, &path, time, service, deadline, rtt_delay);
            let delay = view.path_delay(node, upstream);
            rtt_delay += 2.0 * delay;
            if upstream != source {
                controller.add_event(time + delay, receiver, service, upstream, flow_id, deadline, rtt_delay, StatusCode::Request);
            } else {
                let service_time = view.services()[service.index()].service_time;
                controller.add_event(time + rtt_delay + service_time, receiver, service, receiver, flow_id, deadline, rtt_delay, StatusCode::Response);
            }

            let num_services = view.num_services();
            for &n in &path[1..] {
                if view.comp_spot(n).is_cloud {
                    continue;
                }
                let service_time = view.services()[service.index()].service_time;
                util_slot(&mut self.service_node_util, receiver, n, num_services)[service.index()] += service_time;
            }
            return Ok(());
        }

        if status == StatusCode::Request && node != source {
            let compspot = view.comp_spot_mut(node);
            let queued = compspot.scheduler.upcoming_task_queue.iter().any(|t| t.flow_id == flow_id);
            if !queued {
                return Err(CoreError::TaskNotQueued { flow_id, node });
            }
            if let Some(task) = compspot.scheduler.schedule(time) {
                let is_cloud = compspot.is_cloud;
                controller.add_event(task.completion_time, task.receiver, task.service_id, node, task.flow_id, task.expiry, task.rtt_delay, StatusCode::TaskComplete);
                controller.execute_service(task.flow_id, task.service_id, node, time, is_cloud);
            }
            return Ok(());
        }

        match status {
            StatusCode::TaskComplete => {
                let compspot = view.comp_spot_mut(node);
                if let Some(task) = compspot.scheduler.schedule(time) {
                    let is_cloud = compspot.is_cloud;
                    controller.add_event(task.completion_time, task.receiver, task.service_id, node, task.flow_id, task.expiry, task.rtt_delay, StatusCode::TaskComplete);
                    controller.execute_service(task.flow_id, task.service_id, node, time, is_cloud);
                }
                let delay = view.path_delay(node, receiver);
                controller.add_event(time + delay, receiver, service, receiver, flow_id, deadline, rtt_delay, StatusCode::Response);
                Ok(())
            }
            StatusCode::Response if node == receiver => {
                controller.end_session(true, time, flow_id);
                Ok(())
            }
            other => Err(CoreError::UnrecognisedStatus(other as i32)),
        }
    }
}
