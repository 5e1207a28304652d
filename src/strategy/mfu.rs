/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Usage-ranked VM replacement bounded by a per-interval swap budget: swap
//! the least-used resident service for the most-demanded absent one,
//! repeating up to `n_replacements` times per node per interval.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::StrategyConfig;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::event::{Event, StatusCode};
use crate::ids::{NodeId, ServiceId, SimTime};
use crate::view::View;

use super::Strategy;

pub struct MostFrequentlyUsed {
    replacement_interval: SimTime,
    n_replacements: u32,
    last_replacement: SimTime,
    debug: bool,
    deadline_metric: BTreeMap<(NodeId, ServiceId), f64>,
    cand_deadline_metric: BTreeMap<(NodeId, ServiceId), f64>,
}

impl MostFrequentlyUsed {
    pub fn new(config: &StrategyConfig) -> Self {
        MostFrequentlyUsed {
            replacement_interval: config.replacement_interval,
            n_replacements: config.n_replacements,
            last_replacement: 0.0,
            debug: config.debug,
            deadline_metric: BTreeMap::new(),
            cand_deadline_metric: BTreeMap::new(),
        }
    }

    fn initialise_metrics(&mut self, view: &mut dyn View) {
        for &node in &view.service_nodes() {
            let compspot = view.comp_spot_mut(node);
            if compspot.is_cloud {
                continue;
            }
            compspot.running_requests.clear();
            compspot.missed_requests.clear();
            compspot.scheduler.idle_time = 0.0;
        }
        self.deadline_metric.clear();
        self.cand_deadline_metric.clear();
    }

    /// Usage-ranked replacement, capped at `self.n_replacements` swaps per
    /// node: pair the least-used resident service against the most-demanded
    /// absent one while the absent one's usage still dominates.
    fn replace_services(&mut self, view: &mut dyn View, controller: &mut dyn Controller) {
        let num_services = view.num_services();
        for node in view.service_nodes() {
            if view.comp_spot(node).is_cloud {
                continue;
            }
            let mut n_replacements = self.n_replacements;

            let mut vms: Vec<(usize, f64)> = Vec::new();
            let mut cand_services: Vec<(usize, f64)> = Vec::new();

            for service in 0..num_services {
                let compspot = view.comp_spot(node);
                let instances = compspot.service_instances.get(&ServiceId(service)).copied().unwrap_or(0);
                if instances == 0 {
                    continue;
                }
                let running = compspot.running_requests.get(&ServiceId(service)).copied().unwrap_or(0);
                let service_time = view.services()[service].service_time;
                let usage = if running == 0 { 0.0 } else { running as f64 * service_time };
                vms.push((service, usage));
            }

            for service in 0..num_services {
                let compspot = view.comp_spot(node);
                let missed = compspot.missed_requests.get(&ServiceId(service)).copied().unwrap_or(0);
                if missed == 0 {
                    continue;
                }
                let service_time = view.services()[service].service_time;
                cand_services.push((service, missed as f64 * service_time));
            }

            vms.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
            cand_services.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

            let mut indx = 0usize;
            let mut swapped = 0u32;
            for &(service_vm, vm_usage) in &vms {
                if indx >= cand_services.len() {
                    break;
                }
                let (service_cand, cand_usage) = cand_services[indx];
                if vm_usage > cand_usage {
                    break;
                }
                if service_vm != service_cand {
                    view.comp_spot_mut(node).reassign_vm(controller, Some(ServiceId(service_vm)), ServiceId(service_cand));
                    n_replacements = n_replacements.saturating_sub(1);
                    swapped += 1;
                }
                if n_replacements == 0 || indx == cand_services.len() {
                    break;
                }
                indx += 1;
            }
            if swapped > 0 {
                debug!(node = node.0, swapped, "MFU VM replacement pass");
            }
        }
    }
}

impl Strategy for MostFrequentlyUsed {
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
            self.replace_services(view, controller);
            self.last_replacement = time;
            self.initialise_metrics(view);
        }

        if source == node && status == StatusCode::Request {
            let svc = view.services()[service.index()];
            let path_delay_to_receiver = view.path_delay(node, receiver);
            let (ok, _reason) = view.comp_spot_mut(node).admit_task(&svc, time, flow_id, deadline, receiver, rtt_delay, path_delay_to_receiver, controller);
            if !ok {
                return Err(CoreError::CloudRejectedTask { node, flow_id });
            }
            return Ok(());
        }

        if receiver == node && status == StatusCode::Request {
            controller.start_session(time, receiver, service, self.debug, flow_id, deadline);
            let path = view.shortest_path(node, source);
            let next_node = path[1];
            let delay = view.path_delay(node, next_node);
            rtt_delay += 2.0 * delay;
            controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Request);
            return Ok(());
        }

        match status {
            StatusCode::Response => {
                if node == receiver {
                    controller.end_session(true, time, flow_id);
                } else {
                    let path = view.shortest_path(node, receiver);
                    let next_node = path[1];
                    let delay = view.link_delay(node, next_node);
                    controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Response);
                }
            }
            StatusCode::TaskComplete => {
                if node != source {
                    let compspot = view.comp_spot_mut(node);
                    if let Some(task) = compspot.scheduler.schedule(time) {
                        let is_cloud = compspot.is_cloud;
                        controller.add_event(task.completion_time, task.receiver, task.service_id, node, task.flow_id, task.expiry, task.rtt_delay, StatusCode::TaskComplete);
                        controller.execute_service(task.flow_id, task.service_id, node, time, is_cloud);
                    }
                }
                let path = view.shortest_path(node, receiver);
                let next_node = path[1];
                let delay = view.link_delay(node, next_node);
                controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Response);
            }
            StatusCode::Request => {
                let path = view.shortest_path(node, source);
                let next_node = path[1];
                let delay = view.path_delay(node, next_node);
                let service_time = view.services()[service.index()].service_time;
                let deadline_metric_val = (deadline - time - rtt_delay - service_time) / deadline;

                if view.has_service(node, service) {
                    let svc = view.services()[service.index()];
                    let path_delay_to_receiver = view.path_delay(node, receiver);
                    let (ok, _reason) = view.comp_spot_mut(node).admit_task(&svc, time, flow_id, deadline, receiver, rtt_delay, path_delay_to_receiver, controller);
                    if !ok {
                        rtt_delay += 2.0 * delay;
                        controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Request);
                        if deadline_metric_val > 0.0 {
                            *self.cand_deadline_metric.entry((node, service)).or_insert(0.0) += deadline_metric_val;
                        }
                    } else if deadline_metric_val > 0.0 {
                        *self.deadline_metric.entry((node, service)).or_insert(0.0) += deadline_metric_val;
                    }
                } else {
                    *view.comp_spot_mut(node).missed_requests.entry(service).or_insert(0) += 1;
                    rtt_delay += 2.0 * delay;
                    controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Request);
                    if deadline_metric_val > 0.0 {
                        *self.cand_deadline_metric.entry((node, service)).or_insert(0.0) += deadline_metric_val;
                    }
                }
            }
        }
        Ok(())
    }
}
