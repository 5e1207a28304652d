/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The abstract strategy contract and the five concrete placement/routing
//! strategies built on top of it.

pub mod coordinated;
pub mod hybrid;
pub mod lru;
pub mod mfu;
pub mod sdf;

pub use coordinated::Coordinated;
pub use hybrid::Hybrid;
pub use lru::Lru;
pub use mfu::MostFrequentlyUsed;
pub use sdf::StrictestDeadlineFirst;

use crate::controller::Controller;
use crate::error::CoreError;
use crate::event::Event;
use crate::ids::SimTime;
use crate::view::View;

/// The event handler every concrete placement/routing strategy implements.
///
/// A registry (see [`crate::registry::build_strategy`]) maps the five string
/// tags this crate recognises onto a boxed `Strategy`, replacing dynamic
/// subclass dispatch with a trait object.
pub trait Strategy {
    fn process_event(
        &mut self,
        view: &mut dyn View,
        controller: &mut dyn Controller,
        event: Event,
    ) -> Result<(), CoreError>;
}

impl std::fmt::Debug for dyn Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Strategy")
    }
}

/// Whether a replacement pass is due: more than `interval` has elapsed since
/// `last_replacement`. Shared by every concrete strategy's `process_event`.
pub fn replacement_due(last_replacement: SimTime, interval: SimTime, time: SimTime) -> bool {
    time - last_replacement > interval
}

/// Round-trip slack remaining for a request: `deadline - time - rtt_delay -
/// service_time`. Only a positive value is meaningful as a margin.
pub fn slack(deadline: SimTime, time: SimTime, rtt_delay: SimTime, service_time: SimTime) -> SimTime {
    deadline - time - rtt_delay - service_time
}
