//! The event shape strategies consume.
//!
//! Mirrors the three status codes the reference routing strategies switch
//! on: a request travelling toward the origin, a response travelling back to
//! the receiver, and the local "a core just finished a task" notification a
//! node raises against itself.

use crate::ids::{FlowId, NodeId, ServiceId, SimTime};

/// Stage of a request/response's journey through the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// A request travelling from receiver toward the service's origin.
    Request = 0,
    /// A response travelling from the execution node back to the receiver.
    Response = 1,
    /// A compute spot's core has finished running a task.
    TaskComplete = 2,
}

/// One unit of work delivered to [`crate::strategy::Strategy::process_event`].
#[derive(Debug, Clone)]
pub struct Event {
    pub time: SimTime,
    pub receiver: NodeId,
    pub service: ServiceId,
    pub node: NodeId,
    pub flow_id: FlowId,
    pub deadline: SimTime,
    pub rtt_delay: SimTime,
    pub status: StatusCode,
}
