/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Deadline-aware request routing and service-placement strategies for an
//! edge-computing simulation.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── ids              – typed node/service identifiers, time/flow aliases
//! ├── event            – the event shape strategies consume
//! ├── service          – service catalog entry (execution time, deadline)
//! ├── task             – admitted-task record and admission outcomes
//! ├── error            – invariant-violation errors
//! ├── scheduler        – per-compute-spot core admission and dispatch
//! ├── compute_spot      – VM pool, residency, and admission policy
//! ├── view / controller – the read-only and mutating interfaces a strategy is driven through
//! ├── config           – strategy tunable loading (YAML)
//! ├── strategy          – the five placement/routing strategies
//! └── registry          – strategy-tag to implementation lookup
//! ```

pub mod compute_spot;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod ids;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod strategy;
pub mod task;
pub mod testing;
pub mod view;

pub use error::CoreError;
pub use registry::build_strategy;
pub use strategy::Strategy;
