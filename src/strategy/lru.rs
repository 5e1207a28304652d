/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Distributed, cache-style service placement: a compute spot that lacks a
//! resident instance for the requested service probabilistically evicts its
//! least-recently-used resident service to make room.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::event::{Event, StatusCode};
use crate::ids::SimTime;
use crate::task::AdmissionReason;
use crate::view::View;

use super::Strategy;

pub struct Lru {
    last_replacement: SimTime,
    replacement_interval: SimTime,
    debug: bool,
    p: f64,
    rng: StdRng,
}

impl Lru {
    pub fn new(config: &StrategyConfig) -> Self {
        Lru {
            last_replacement: 0.0,
            replacement_interval: config.replacement_interval,
            debug: config.debug,
            p: config.p,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }
}

impl Strategy for Lru {
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
            self.last_replacement = time;
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
            rtt_delay += delay * 2.0;
            controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Request);
            return Ok(());
        }

        if !view.has_computational_spot(node) {
            if status != StatusCode::Response {
                if node == source {
                    return Err(CoreError::TaskNotQueued { flow_id, node });
                }
                let path = view.shortest_path(node, source);
                let next_node = path[1];
                let delay = view.link_delay(node, next_node);
                controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay + 2.0 * delay, StatusCode::Request);
                return Ok(());
            }
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
                let compspot = view.comp_spot_mut(node);
                if let Some(task) = compspot.scheduler.schedule(time) {
                    controller.add_event(task.completion_time, task.receiver, task.service_id, node, task.flow_id, task.expiry, task.rtt_delay, StatusCode::TaskComplete);
                    controller.execute_service(task.flow_id, task.service_id, node, time, compspot.is_cloud);
                }
                let path = view.shortest_path(node, receiver);
                let next_node = path[1];
                let delay = view.link_delay(node, next_node);
                let path_delay = view.path_delay(node, receiver);
                if (time + path_delay) > deadline && node != source {
                    warn!(flow_id, node = node.0, "LRU missed a deadline after execution");
                }
                controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Response);
            }
            StatusCode::Request => {
                let path = view.shortest_path(node, source);
                let next_node = path[1];
                let delay = view.path_delay(node, next_node);
                let svc = view.services()[service.index()];
                let path_delay_to_receiver = view.path_delay(node, receiver);
                let compspot = view.comp_spot_mut(node);
                let (ok, reason) = compspot.admit_task(&svc, time, flow_id, deadline, receiver, rtt_delay, path_delay_to_receiver, controller);
                if !ok {
                    if reason == AdmissionReason::NoInstances {
                        let would_miss_upstream = deadline - time - rtt_delay - 2.0 * delay < svc.service_time;
                        if would_miss_upstream || self.p == 1.0 || self.rng.gen::<f64>() <= self.p {
                            let evicted = controller.put_content(node, service);
                            if let Some(evicted) = evicted {
                                let compspot = view.comp_spot_mut(node);
                                compspot.reassign_vm(controller, Some(evicted), service);
                            } else {
                                debug!(node = node.0, service = service.0, "cache had room; no eviction needed");
                            }
                        }
                    }
                    rtt_delay += 2.0 * delay;
                    controller.add_event(time + delay, receiver, service, next_node, flow_id, deadline, rtt_delay, StatusCode::Request);
                } else {
                    controller.get_content(node, service);
                }
            }
        }
        Ok(())
    }
}
