/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Invariant-violation errors.
//!
//! [`crate::task::AdmissionReason`] covers expected, recoverable outcomes.
//! `CoreError` is the other failure layer: a signal that an invariant the
//! strategies depend on has been broken (a task vanished from a queue it was
//! just inserted into, an unknown status code arrived, the cloud rejected a
//! task it is never supposed to reject). None of these should ever fire in
//! correct operation; they exist to fail fast rather than silently corrupt
//! simulation state.

use thiserror::Error;

use crate::ids::{FlowId, NodeId};

#[derive(Debug, Error)]
pub enum CoreError {
    /// A strategy tag passed to [`crate::registry::build_strategy`] does not
    /// name one of the five registered strategies.
    #[error("unknown strategy tag: '{0}' (valid: COORDINATED, LRU, HYBRID, MFU, SDF)")]
    UnknownStrategy(String),

    /// A feasibility probe expected to find the task it had just inserted
    /// into `upcoming_task_queue` and did not.
    #[error("flow {flow_id} has no task in the upcoming queue at node {node}")]
    TaskNotQueued { flow_id: FlowId, node: NodeId },

    /// The cloud rejected a task; cloud spots have unbounded capacity and
    /// must accept every admission request.
    #[error("cloud compute spot at node {node} rejected flow {flow_id}")]
    CloudRejectedTask { node: NodeId, flow_id: FlowId },

    /// `process_event` received a status code value outside the three
    /// recognised stages.
    #[error("unrecognised event status code: {0}")]
    UnrecognisedStatus(i32),

    /// A replacement pass tried to reassign more VMs than a compute spot has.
    #[error("node {node} has only {available} VMs, cannot allocate {requested}")]
    VmPoolExhausted {
        node: NodeId,
        available: u32,
        requested: u32,
    },
}
