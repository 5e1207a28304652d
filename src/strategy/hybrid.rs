/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Usage-ranked VM replacement: swap an under-used resident service for an
//! over-demanded absent one whenever the latter's deadline slack is
//! tighter, with no cap on swaps per node per interval.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::event::{Event, StatusCode};
use crate::ids::{NodeId, ServiceId, SimTime};
use crate::view::View;

use super::Strategy;

pub struct Hybrid {
    replacement_interval: SimTime,
    last_replacement: SimTime,
    debug: bool,
    deadline_metric: BTreeMap<(NodeId, ServiceId), f64>,
    cand_deadline_metric: BTreeMap<(NodeId, ServiceId), f64>,
}

impl Hybrid {
    pub fn new(config: &StrategyConfig) -> Self {
        Hybrid {
            replacement_interval: config.replacement_interval,
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

    fn replace_services1(&mut self, view: &mut dyn View, controller: &mut dyn Controller, _time: SimTime) {
        let num_services = view.num_services();
        for node in view.service_nodes() {
            if view.comp_spot(node).is_cloud {
                continue;
            }

            let mut running: Vec<(usize, f64)> = Vec::new();
            let mut missed: Vec<(usize, f64)> = Vec::new();
            let mut delay = vec![0.0f64; num_services];

            for service in 0..num_services {
                let compspot = view.comp_spot(node);
                let instances = compspot.service_instances.get(&ServiceId(service)).copied().unwrap_or(0);
                let service_time = view.services()[service].service_time;
                let compspot = view.comp_spot(node);
                let missed_count = compspot.missed_requests.get(&ServiceId(service)).copied().unwrap_or(0);
                let running_count = compspot.running_requests.get(&ServiceId(service)).copied().unwrap_or(0);

                if instances == 0 {
                    let d_metric = if missed_count > 0 {
                        self.cand_deadline_metric.get(&(node, ServiceId(service))).copied().unwrap_or(0.0) / missed_count as f64
                    } else {
                        f64::INFINITY
                    };
                    delay[service] = d_metric;
                    let mut u_metric = missed_count as f64 * service_time;
                    if u_metric > self.replacement_interval {
                        u_metric = self.replacement_interval;
                    }
                    missed.push((service, u_metric));
                } else {
                    let d_metric = if running_count > 0 {
                        self.deadline_metric.get(&(node, ServiceId(service))).copied().unwrap_or(0.0) / running_count as f64
                    } else {
                        f64::INFINITY
                    };
                    self.deadline_metric.insert((node, ServiceId(service)), d_metric);
                    let u_metric_served = (running_count as f64 * service_time) / instances as f64;
                    running.push((service, u_metric_served / instances as f64));
                    delay[service] = d_metric;
                }
            }

            running.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
            missed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

            let mut n_replacements = 0u32;
            'missed_loop: for &(service_missed, missed_util) in &missed {
                let mut indx = 0;
                while indx < running.len() {
                    let (service_running, running_util) = running[indx];
                    if running_util > missed_util {
                        break 'missed_loop;
                    }
                    if service_running == service_missed {
                        indx += 1;
                        continue;
                    }
                    if missed_util >= running_util && delay[service_missed] < delay[service_running] && delay[service_missed] > 0.0 {
                        view.comp_spot_mut(node).reassign_vm(controller, Some(ServiceId(service_running)), ServiceId(service_missed));
                        running.remove(indx);
                        n_replacements += 1;
                        break;
                    }
                    indx += 1;
                }
            }
            if n_replacements > 0 {
                debug!(node = node.0, n_replacements, "hybrid VM replacement pass");
            }
        }
    }
}

impl Strategy for Hybrid {
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
            self.replace_services1(view, controller, time);
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
                    let path_del = view.path_delay(node, receiver);
                    controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Response);
                    if path_del + time > deadline {
                        *view.comp_spot_mut(node).missed_requests.entry(service).or_insert(0) += 1;
                    }
                }
            }
            StatusCode::TaskComplete => {
                if node != source {
                    let compspot = view.comp_spot_mut(node);
                    if let Some(task) = compspot.scheduler.schedule(time) {
                        let is_cloud = compspot.is_cloud;
                        controller.add_event(task.completion_time, task.receiver, task.service_id, node, task.flow_id, task.expiry, task.rtt_delay, StatusCode::TaskComplete);
                        controller.execute_service(task.flow_id, task.service_id, node, time, is_cloud);
                        if task.expiry < time + view.path_delay(node, task.receiver) {
                            warn!(flow_id = task.flow_id, node = node.0, "hybrid task missed its deadline after execution");
                        }
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
                let deadline_metric_val = deadline - time - rtt_delay - service_time;

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
