/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! In-memory [`View`]/[`Controller`]/[`Topology`] fixtures for strategy unit
//! and scenario tests.
//!
//! [`TestNetwork`] owns every piece of simulated state. Because
//! [`crate::strategy::Strategy::process_event`] takes `&mut dyn View` and
//! `&mut dyn Controller` as two independent parameters, driving a test
//! borrows disjoint fields of [`TestNetwork`] into two short-lived adapter
//! values ([`NetView`], [`NetController`]) rather than implementing both
//! traits on [`TestNetwork`] itself.

use std::collections::{BTreeMap, VecDeque};

use crate::compute_spot::ComputeSpot;
use crate::controller::Controller;
use crate::event::{Event, StatusCode};
use crate::ids::{FlowId, NodeId, ServiceId, SimTime};
use crate::service::Service;
use crate::strategy::Strategy;
use crate::view::{Topology, View};

#[derive(Debug, Clone)]
pub struct StartedSession {
    pub time: SimTime,
    pub receiver: NodeId,
    pub service: ServiceId,
    pub flow_id: FlowId,
    pub deadline: SimTime,
}

#[derive(Debug, Clone)]
pub struct EndedSession {
    pub successful: bool,
    pub time: SimTime,
    pub flow_id: FlowId,
}

#[derive(Debug, Clone)]
pub struct Reassignment {
    pub node: NodeId,
    pub from_service: Option<ServiceId>,
    pub to_services: Vec<ServiceId>,
}

#[derive(Debug, Clone)]
pub struct Execution {
    pub flow_id: FlowId,
    pub service: ServiceId,
    pub node: NodeId,
    pub time: SimTime,
    pub is_cloud: bool,
}

/// Owns every piece of state a strategy can read or mutate during a test.
pub struct TestNetwork {
    pub links: BTreeMap<(NodeId, NodeId), SimTime>,
    pub depth: BTreeMap<NodeId, u32>,
    pub height: u32,
    pub receivers: Vec<NodeId>,
    pub services: Vec<Service>,
    pub content_sources: BTreeMap<ServiceId, NodeId>,
    pub comp_spots: BTreeMap<NodeId, ComputeSpot>,
    pub cache_capacity: BTreeMap<NodeId, u32>,
    pub caches: BTreeMap<NodeId, Vec<ServiceId>>,

    pub events: Vec<Event>,
    pub sessions_started: Vec<StartedSession>,
    pub sessions_ended: Vec<EndedSession>,
    pub reassignments: Vec<Reassignment>,
    pub executions: Vec<Execution>,
    pub replacements: Vec<(FlowId, SimTime, SimTime)>,
}

impl TestNetwork {
    pub fn new() -> Self {
        TestNetwork {
            links: BTreeMap::new(),
            depth: BTreeMap::new(),
            height: 0,
            receivers: Vec::new(),
            services: Vec::new(),
            content_sources: BTreeMap::new(),
            comp_spots: BTreeMap::new(),
            cache_capacity: BTreeMap::new(),
            caches: BTreeMap::new(),
            events: Vec::new(),
            sessions_started: Vec::new(),
            sessions_ended: Vec::new(),
            reassignments: Vec::new(),
            executions: Vec::new(),
            replacements: Vec::new(),
        }
    }

    pub fn link(&mut self, a: NodeId, b: NodeId, delay: SimTime) -> &mut Self {
        self.links.insert((a, b), delay);
        self.links.insert((b, a), delay);
        self
    }

    pub fn depth(&mut self, node: NodeId, depth: u32) -> &mut Self {
        self.depth.insert(node, depth);
        self.height = self.height.max(depth);
        self
    }

    pub fn receiver(&mut self, node: NodeId) -> &mut Self {
        self.receivers.push(node);
        self
    }

    pub fn service(&mut self, service_time: SimTime, deadline: SimTime, source: NodeId) -> ServiceId {
        let id = ServiceId(self.services.len());
        self.services.push(Service { service_id: id, service_time, deadline });
        self.content_sources.insert(id, source);
        id
    }

    pub fn edge_spot(&mut self, node: NodeId, num_cores: usize, num_vms: u32, population: usize) -> &mut Self {
        self.comp_spots.insert(node, ComputeSpot::new_edge(node, num_cores, num_vms, population));
        self.cache_capacity.insert(node, num_vms);
        self
    }

    pub fn cloud_spot(&mut self, node: NodeId) -> &mut Self {
        self.comp_spots.insert(node, ComputeSpot::new_cloud(node));
        self
    }

    /// Borrow the two disjoint halves of this network as the `View` and
    /// `Controller` a `Strategy::process_event` call needs.
    pub fn split(&mut self) -> (NetView<'_>, NetController<'_>) {
        let view = NetView {
            links: &self.links,
            depth: &self.depth,
            height: self.height,
            receivers: &self.receivers,
            services: &self.services,
            content_sources: &self.content_sources,
            comp_spots: &mut self.comp_spots,
        };
        let controller = NetController {
            cache_capacity: &self.cache_capacity,
            caches: &mut self.caches,
            events: &mut self.events,
            sessions_started: &mut self.sessions_started,
            sessions_ended: &mut self.sessions_ended,
            reassignments: &mut self.reassignments,
            executions: &mut self.executions,
            replacements: &mut self.replacements,
        };
        (view, controller)
    }

    /// Drive `strategy` by repeatedly popping the earliest-time pending
    /// event and processing it, until the queue is empty or `max_steps` is
    /// exceeded (a loop-detection backstop, not a simulation feature).
    pub fn run(&mut self, strategy: &mut dyn Strategy, seed: Event, max_steps: usize) -> Result<(), crate::error::CoreError> {
        self.events.push(seed);
        let mut steps = 0;
        while let Some(pos) = self
            .events
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.time.partial_cmp(&b.time).unwrap())
            .map(|(i, _)| i)
        {
            if steps >= max_steps {
                break;
            }
            let event = self.events.remove(pos);
            let (mut view, mut controller) = self.split();
            strategy.process_event(&mut view, &mut controller, event)?;
            steps += 1;
        }
        Ok(())
    }
}

impl Default for TestNetwork {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NetView<'a> {
    links: &'a BTreeMap<(NodeId, NodeId), SimTime>,
    depth: &'a BTreeMap<NodeId, u32>,
    height: u32,
    receivers: &'a [NodeId],
    services: &'a [Service],
    content_sources: &'a BTreeMap<ServiceId, NodeId>,
    comp_spots: &'a mut BTreeMap<NodeId, ComputeSpot>,
}

impl Topology for NetView<'_> {
    fn receivers(&self) -> Vec<NodeId> {
        self.receivers.to_vec()
    }

    fn depth(&self, node: NodeId) -> u32 {
        self.depth.get(&node).copied().unwrap_or(0)
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl View for NetView<'_> {
    fn content_source(&self, service: ServiceId) -> NodeId {
        *self.content_sources.get(&service).expect("service has a registered content source")
    }

    fn shortest_path(&self, a: NodeId, b: NodeId) -> Vec<NodeId> {
        bfs_path(self.links, a, b)
    }

    fn path_delay(&self, a: NodeId, b: NodeId) -> SimTime {
        let path = self.shortest_path(a, b);
        path.windows(2).map(|w| self.link_delay(w[0], w[1])).sum()
    }

    fn link_delay(&self, a: NodeId, b: NodeId) -> SimTime {
        *self.links.get(&(a, b)).unwrap_or(&0.0)
    }

    fn services(&self) -> &[Service] {
        self.services
    }

    fn num_services(&self) -> usize {
        self.services.len()
    }

    fn has_computational_spot(&self, node: NodeId) -> bool {
        self.comp_spots.contains_key(&node)
    }

    fn has_service(&self, node: NodeId, service: ServiceId) -> bool {
        self.comp_spots.get(&node).map(|cs| cs.has_service(service)).unwrap_or(false)
    }

    fn comp_spot(&self, node: NodeId) -> &ComputeSpot {
        self.comp_spots.get(&node).expect("node has a registered compute spot")
    }

    fn comp_spot_mut(&mut self, node: NodeId) -> &mut ComputeSpot {
        self.comp_spots.get_mut(&node).expect("node has a registered compute spot")
    }

    fn service_nodes(&self) -> Vec<NodeId> {
        self.comp_spots.keys().copied().collect()
    }

    fn topology(&self) -> &dyn Topology {
        self
    }
}

fn bfs_path(links: &BTreeMap<(NodeId, NodeId), SimTime>, a: NodeId, b: NodeId) -> Vec<NodeId> {
    if a == b {
        return vec![a];
    }
    let mut adjacency: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for &(from, to) in links.keys() {
        adjacency.entry(from).or_default().push(to);
    }
    let mut visited: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    visited.insert(a, a);
    let mut queue = VecDeque::new();
    queue.push_back(a);
    while let Some(current) = queue.pop_front() {
        if current == b {
            break;
        }
        if let Some(neighbours) = adjacency.get(&current) {
            for &next in neighbours {
                if !visited.contains_key(&next) {
                    visited.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
    }
    let mut path = vec![b];
    let mut current = b;
    while current != a {
        match visited.get(&current) {
            Some(&prev) if prev != current => {
                path.push(prev);
                current = prev;
            }
            _ => break,
        }
    }
    path.reverse();
    path
}

pub struct NetController<'a> {
    cache_capacity: &'a BTreeMap<NodeId, u32>,
    caches: &'a mut BTreeMap<NodeId, Vec<ServiceId>>,
    events: &'a mut Vec<Event>,
    sessions_started: &'a mut Vec<StartedSession>,
    sessions_ended: &'a mut Vec<EndedSession>,
    reassignments: &'a mut Vec<Reassignment>,
    executions: &'a mut Vec<Execution>,
    replacements: &'a mut Vec<(FlowId, SimTime, SimTime)>,
}

impl Controller for NetController<'_> {
    fn start_session(&mut self, time: SimTime, receiver: NodeId, service: ServiceId, _log: bool, flow_id: FlowId, deadline: SimTime) {
        self.sessions_started.push(StartedSession { time, receiver, service, flow_id, deadline });
    }

    fn end_session(&mut self, successful: bool, time: SimTime, flow_id: FlowId) {
        self.sessions_ended.push(EndedSession { successful, time, flow_id });
    }

    fn add_event(&mut self, time: SimTime, receiver: NodeId, service: ServiceId, node: NodeId, flow_id: FlowId, deadline: SimTime, rtt_delay: SimTime, status: StatusCode) {
        self.events.push(Event { time, receiver, service, node, flow_id, deadline, rtt_delay, status });
    }

    fn execute_service(&mut self, flow_id: FlowId, service: ServiceId, node: NodeId, time: SimTime, is_cloud: bool) {
        self.executions.push(Execution { flow_id, service, node, time, is_cloud });
    }

    fn replacement_interval_over(&mut self, flow_id: FlowId, interval: SimTime, time: SimTime) {
        self.replacements.push((flow_id, interval, time));
    }

    fn put_content(&mut self, node: NodeId, service: ServiceId) -> Option<ServiceId> {
        let capacity = self.cache_capacity.get(&node).copied().unwrap_or(1) as usize;
        let cache = self.caches.entry(node).or_default();
        cache.retain(|&s| s != service);
        cache.insert(0, service);
        if cache.len() > capacity.max(1) {
            cache.pop()
        } else {
            None
        }
    }

    fn get_content(&mut self, node: NodeId, service: ServiceId) {
        let cache = self.caches.entry(node).or_default();
        cache.retain(|&s| s != service);
        cache.insert(0, service);
    }

    fn reassign_vm(&mut self, node: NodeId, from_service: Option<ServiceId>, to_services: &[ServiceId]) {
        self.reassignments.push(Reassignment { node, from_service, to_services: to_services.to_vec() });
    }
}
