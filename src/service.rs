//! The read-only service catalog record.

use crate::ids::{ServiceId, SimTime};

/// An immutable catalog entry: a named computation with a fixed per-invocation
/// cost and a fixed end-to-end deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Service {
    pub service_id: ServiceId,
    /// Compute cost of a single invocation, in simulated time units.
    pub service_time: SimTime,
    /// Maximum end-to-end latency permitted from request issuance to response
    /// delivery at the receiver.
    pub deadline: SimTime,
}
