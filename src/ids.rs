//! Typed identifiers used throughout the placement core.
//!
//! The strategy source this crate is modelled on encodes receiver identity as
//! a string (`"rcv_3"`) parsed back into an integer at every use site. Typed
//! newtypes replace that pattern: a [`NodeId`] or [`ServiceId`] can't be
//! swapped for the other by accident, and there is nothing left to parse.

use std::fmt;

/// Logical simulation time. A plain `f64` alias rather than a newtype because
/// arithmetic on it (`time + delay`, `deadline - time`) is pervasive and a
/// wrapper would only add noise.
pub type SimTime = f64;

/// Identifies a single request's lifecycle from issuance to response.
pub type FlowId = u64;

macro_rules! index_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                $name(v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_id!(NodeId, "A node in the simulated topology.");
index_id!(ServiceId, "A service in the catalog served by the simulation.");
