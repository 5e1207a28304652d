/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-[`crate::compute_spot::ComputeSpot`] task admission, queueing, and
//! dispatch.
//!
//! [`TaskScheduler`] owns a fixed set of cores (unbounded, growing on demand,
//! for the cloud — see [`TaskScheduler::cloud`]) and two queues: `task_queue`
//! for admitted tasks that have already arrived, and `upcoming_task_queue`
//! for tasks whose arrival is still in the future (used by the coordinated
//! strategy's feasibility probe, which tentatively inserts a task here before
//! it is known to be admissible).

use std::collections::VecDeque;

use tracing::debug;

use crate::ids::{FlowId, NodeId, SimTime};
use crate::service::Service;
use crate::task::{AdmissionReason, Task};

/// A single compute core. `busy_until` is a projected timeline updated
/// immediately at admission time, not at dispatch time — admitting a task
/// reserves its slot on the core right away.
#[derive(Debug, Clone, Copy, Default)]
pub struct Core {
    pub busy_until: SimTime,
}

/// Queue/core manager for one compute spot.
#[derive(Debug)]
pub struct TaskScheduler {
    pub cores: Vec<Core>,
    pub task_queue: VecDeque<Task>,
    pub upcoming_task_queue: Vec<Task>,
    pub idle_time: SimTime,
    is_cloud: bool,
}

impl TaskScheduler {
    /// A scheduler for an edge compute spot with a fixed number of cores.
    pub fn new(num_cores: usize) -> Self {
        TaskScheduler {
            cores: vec![Core::default(); num_cores],
            task_queue: VecDeque::new(),
            upcoming_task_queue: Vec::new(),
            idle_time: 0.0,
            is_cloud: false,
        }
    }

    /// A scheduler for the cloud: unbounded capacity, zero queueing delay.
    /// Cores are grown on demand rather than capped at construction.
    pub fn cloud() -> Self {
        TaskScheduler {
            cores: Vec::new(),
            task_queue: VecDeque::new(),
            upcoming_task_queue: Vec::new(),
            idle_time: 0.0,
            is_cloud: true,
        }
    }

    pub fn is_cloud(&self) -> bool {
        self.is_cloud
    }

    /// Index of the core with the smallest projected `busy_until`.
    fn least_busy_core(&self) -> usize {
        self.cores
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.busy_until.partial_cmp(&b.busy_until).unwrap())
            .map(|(i, _)| i)
            .expect("a TaskScheduler always has at least one core, or is a cloud scheduler")
    }

    /// Try to admit a new task for `service`, arriving at `node` at `time`.
    ///
    /// `path_delay_to_receiver` is supplied by the caller (the strategy,
    /// which holds the view needed to compute it) rather than looked up
    /// here.
    #[allow(clippy::too_many_arguments)]
    pub fn admit_task(
        &mut self,
        service: &Service,
        time: SimTime,
        flow_id: FlowId,
        deadline: SimTime,
        receiver: NodeId,
        rtt_delay: SimTime,
        node: NodeId,
        path_delay_to_receiver: SimTime,
    ) -> (bool, AdmissionReason) {
        if self.is_cloud {
            // Unbounded capacity: every task gets a dedicated, immediately
            // available core.
            self.cores.push(Core {
                busy_until: time + service.service_time,
            });
            let mut task = Task::new(time, deadline, rtt_delay, node, service.service_id, service.service_time, flow_id, receiver, time);
            task.completion_time = time + service.service_time;
            task.core_id = Some(self.cores.len() - 1);
            self.task_queue.push_back(task);
            return (true, AdmissionReason::Cloud);
        }

        let arrival_time = time;
        let deadline_bound = deadline - path_delay_to_receiver;

        // Would this task make it even on an idle core? If not, no amount of
        // rescheduling helps — it is intrinsically infeasible.
        let ideal_completion = arrival_time + service.service_time;
        if ideal_completion > deadline_bound {
            debug!(flow_id, node = node.0, service = service.service_id.0, "admission rejected: deadline missed");
            return (false, AdmissionReason::DeadlineMissed);
        }

        let core_idx = self.least_busy_core();
        let projected_start = self.cores[core_idx].busy_until.max(arrival_time);
        let projected_completion = projected_start + service.service_time;

        if projected_completion > deadline_bound {
            debug!(flow_id, node = node.0, service = service.service_id.0, "admission rejected: congestion");
            return (false, AdmissionReason::Congestion);
        }

        self.cores[core_idx].busy_until = projected_completion;

        let mut task = Task::new(
            time,
            deadline,
            rtt_delay,
            node,
            service.service_id,
            service.service_time,
            flow_id,
            receiver,
            arrival_time,
        );
        task.completion_time = projected_completion;
        task.core_id = Some(core_idx);
        self.task_queue.push_back(task);

        (true, AdmissionReason::Success)
    }

    /// Insert a tentative task into `upcoming_task_queue`, keeping it sorted
    /// by `arrival_time`. Used by the coordinated feasibility probe, which
    /// may later remove it if infeasible.
    pub fn insert_upcoming(&mut self, task: Task) {
        let pos = self
            .upcoming_task_queue
            .partition_point(|t| t.arrival_time <= task.arrival_time);
        self.upcoming_task_queue.insert(pos, task);
    }

    /// Remove the most recently inserted task for `flow_id` from
    /// `upcoming_task_queue` (used to undo a failed feasibility probe).
    pub fn remove_upcoming(&mut self, flow_id: FlowId) -> Option<Task> {
        let pos = self.upcoming_task_queue.iter().position(|t| t.flow_id == flow_id)?;
        Some(self.upcoming_task_queue.remove(pos))
    }

    /// Replay the FIFO assignment of `task_queue ∪ upcoming_task_queue` over
    /// the cores (each task goes to whichever core is least busy at the
    /// point it is considered, processed in arrival order), refreshing every
    /// task's projected `completion_time`.
    pub fn compute_completion_times(&mut self, _time: SimTime) {
        let mut projected: Vec<SimTime> = vec![0.0; self.cores.len().max(1)];

        let mut all: Vec<&mut Task> = self
            .task_queue
            .iter_mut()
            .chain(self.upcoming_task_queue.iter_mut())
            .collect();
        all.sort_by(|a, b| a.arrival_time.partial_cmp(&b.arrival_time).unwrap());

        for task in all {
            let core_idx = projected
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                .map(|(i, _)| i)
                .unwrap_or(0);
            let start = projected[core_idx].max(task.arrival_time);
            let completion = start + task.service_time;
            projected[core_idx] = completion;
            task.completion_time = completion;
            task.core_id = Some(core_idx);
        }
    }

    /// Dispatch the next eligible task (earliest arrival from
    /// `upcoming_task_queue`, falling back to the front of `task_queue`)
    /// whose `arrival_time <= time`, placing it on the next-available core.
    pub fn schedule(&mut self, time: SimTime) -> Option<Task> {
        let mut chosen_from_upcoming = false;
        let candidate_arrival = match (
            self.upcoming_task_queue.first(),
            self.task_queue.front(),
        ) {
            (Some(u), Some(t)) if u.arrival_time <= t.arrival_time => {
                chosen_from_upcoming = true;
                Some(u.arrival_time)
            }
            (Some(u), None) => {
                chosen_from_upcoming = true;
                Some(u.arrival_time)
            }
            (_, Some(t)) => Some(t.arrival_time),
            (None, None) => None,
        };

        let arrival_time = candidate_arrival?;
        if arrival_time > time {
            self.idle_time += 0.0; // no task ready yet; caller tracks wall idle separately
            return None;
        }

        let mut task = if chosen_from_upcoming {
            self.upcoming_task_queue.remove(0)
        } else {
            self.task_queue.pop_front().unwrap()
        };

        if self.is_cloud {
            self.cores.push(Core {
                busy_until: time + task.service_time,
            });
            task.core_id = Some(self.cores.len() - 1);
            task.completion_time = time + task.service_time;
            return Some(task);
        }

        let core_idx = self.least_busy_core();
        let idle_gap = (self.cores[core_idx].busy_until - time).max(0.0);
        self.idle_time += idle_gap;

        let start = self.cores[core_idx].busy_until.max(task.arrival_time).max(time);
        let completion = start + task.service_time;
        self.cores[core_idx].busy_until = completion;
        task.core_id = Some(core_idx);
        task.completion_time = completion;

        Some(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ServiceId;

    fn svc(service_time: SimTime, deadline: SimTime) -> Service {
        Service {
            service_id: ServiceId(0),
            service_time,
            deadline,
        }
    }

    #[test]
    fn single_core_admits_task_that_fits() {
        let mut ts = TaskScheduler::new(1);
        let (ok, reason) = ts.admit_task(&svc(1.0, 10.0), 0.0, 1, 10.0, NodeId(0), 0.0, NodeId(1), 0.0);
        assert!(ok);
        assert_eq!(reason, AdmissionReason::Success);
        assert_eq!(ts.task_queue.len(), 1);
    }

    #[test]
    fn second_back_to_back_task_is_congested_not_deadline_missed() {
        // 1 core, service_time=5, deadline=6: first admits, second would
        // fit on an idle core (0+5<=6) but not behind the first (5+5=10>6).
        let mut ts = TaskScheduler::new(1);
        let (ok1, _) = ts.admit_task(&svc(5.0, 6.0), 0.0, 1, 6.0, NodeId(0), 0.0, NodeId(1), 0.0);
        assert!(ok1);
        let first_completion = ts.task_queue[0].completion_time;

        let (ok2, reason2) = ts.admit_task(&svc(5.0, 6.0), 0.0, 2, 6.0, NodeId(0), 0.0, NodeId(1), 0.0);
        assert!(!ok2);
        assert_eq!(reason2, AdmissionReason::Congestion);
        assert_eq!(ts.task_queue[0].completion_time, first_completion, "first task unaffected by rejected second");
    }

    #[test]
    fn intrinsically_infeasible_task_is_deadline_missed() {
        let mut ts = TaskScheduler::new(1);
        let (ok, reason) = ts.admit_task(&svc(20.0, 6.0), 0.0, 1, 6.0, NodeId(0), 0.0, NodeId(1), 0.0);
        assert!(!ok);
        assert_eq!(reason, AdmissionReason::DeadlineMissed);
    }

    #[test]
    fn cloud_scheduler_always_admits() {
        let mut ts = TaskScheduler::cloud();
        for i in 0..5 {
            let (ok, reason) = ts.admit_task(&svc(100.0, 0.001), 0.0, i, 0.001, NodeId(0), 0.0, NodeId(1), 0.0);
            assert!(ok);
            assert_eq!(reason, AdmissionReason::Cloud);
        }
    }

    #[test]
    fn upcoming_queue_stays_sorted_by_arrival() {
        let mut ts = TaskScheduler::new(2);
        let mk = |arrival: SimTime, flow: FlowId| Task::new(0.0, 100.0, 0.0, NodeId(0), ServiceId(0), 1.0, flow, NodeId(1), arrival);
        ts.insert_upcoming(mk(5.0, 1));
        ts.insert_upcoming(mk(2.0, 2));
        ts.insert_upcoming(mk(8.0, 3));
        let arrivals: Vec<SimTime> = ts.upcoming_task_queue.iter().map(|t| t.arrival_time).collect();
        assert_eq!(arrivals, vec![2.0, 5.0, 8.0]);
    }

    #[test]
    fn schedule_returns_none_when_nothing_ready() {
        let mut ts = TaskScheduler::new(1);
        assert!(ts.schedule(0.0).is_none());
    }
}
