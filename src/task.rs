/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The unit of work that flows through a [`crate::scheduler::TaskScheduler`].
//!
//! A `Task` is created the moment a request is admitted at a compute spot and
//! lives until it completes or is proven infeasible and rolled back. Nothing
//! outside the owning [`crate::compute_spot::ComputeSpot`] mutates a `Task`
//! once it has been admitted.

use crate::ids::{FlowId, NodeId, ServiceId, SimTime};

/// A request admitted for execution at a specific node.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Time the task was admitted.
    pub creation_time: SimTime,
    /// Absolute deadline: the request must complete by this simulated time.
    pub expiry: SimTime,
    /// Round-trip delay already accumulated before this task was created.
    pub rtt_delay: SimTime,
    /// Node this task executes on.
    pub node: NodeId,
    pub service_id: ServiceId,
    pub service_time: SimTime,
    pub flow_id: FlowId,
    pub receiver: NodeId,
    /// Time the task arrives at `node` and becomes eligible to run.
    pub arrival_time: SimTime,
    /// Projected (pre-dispatch) or actual (post-dispatch) completion time.
    pub completion_time: SimTime,
    /// Core the task has been dispatched to, if any.
    pub core_id: Option<usize>,
}

impl Task {
    pub fn new(
        creation_time: SimTime,
        expiry: SimTime,
        rtt_delay: SimTime,
        node: NodeId,
        service_id: ServiceId,
        service_time: SimTime,
        flow_id: FlowId,
        receiver: NodeId,
        arrival_time: SimTime,
    ) -> Self {
        Task {
            creation_time,
            expiry,
            rtt_delay,
            node,
            service_id,
            service_time,
            flow_id,
            receiver,
            arrival_time,
            completion_time: arrival_time,
            core_id: None,
        }
    }
}

/// Why a request was or was not admitted by a [`crate::scheduler::TaskScheduler`]
/// or [`crate::compute_spot::ComputeSpot`].
///
/// These are expected outcomes that drive upstream forwarding — never raised
/// as errors. Carries no data because every admission decision is reported
/// alongside the task/node it concerns by the caller, the same way this
/// codebase keeps fine-grained rejection reasons out of its panic/error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionReason {
    /// No core could finish the task before its deadline.
    DeadlineMissed = 0,
    /// A core exists, but admitting this task would push an already-admitted
    /// task past its own deadline.
    Congestion = 1,
    /// Admitted.
    Success = 2,
    /// Executed unconditionally at the cloud.
    Cloud = 3,
    /// No resident VM instance for the requested service.
    NoInstances = 4,
}

impl std::fmt::Display for AdmissionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AdmissionReason::DeadlineMissed => "deadline would be missed",
            AdmissionReason::Congestion => "admitting this task would congest an already-queued task",
            AdmissionReason::Success => "admitted",
            AdmissionReason::Cloud => "executed at the cloud",
            AdmissionReason::NoInstances => "no resident VM instance for this service",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_starts_with_completion_time_at_arrival() {
        let t = Task::new(0.0, 10.0, 0.0, NodeId(1), ServiceId(0), 2.0, 1, NodeId(0), 3.0);
        assert_eq!(t.completion_time, 3.0);
        assert!(t.core_id.is_none());
    }

    #[test]
    fn admission_reason_display_is_human_readable() {
        assert_eq!(AdmissionReason::Congestion.to_string(), "admitting this task would congest an already-queued task");
        assert_eq!(AdmissionReason::Success.to_string(), "admitted");
    }
}
