//! Atomic value and identifier types shared by the `hwsim` hardware simulator.
//!
//! This crate is deliberately small and dependency-light, the way `fuel-types` carries only the
//! primitives the interpreter crate builds on. Everything in here is a leaf: no type defined here
//! depends on the IR graph, the scheduler, or the simulator.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod ids;
mod sdata;

pub use error::WidthError;
pub use ids::{ClockDomainId, NodeId};
pub use sdata::Sdata;
