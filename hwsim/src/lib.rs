//! `hwsim`: IR elaboration, register/memory semantics, and cycle-accurate simulation.
//!
//! A user-facing EDSL (not part of this crate) builds a module's structure by calling the
//! [`Context`] factory methods to construct [`node::Node`]s — registers, memories, combinational
//! operators, ports — into a graph. [`Context::finalize`] compiles that graph into a
//! [`schedule::CompiledSchedule`], and [`simulator::Simulator`] drives it cycle by cycle.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod node;
pub mod schedule;
pub mod scope;
pub mod simulator;
pub mod trace;

pub mod prelude {
    //! Everything needed to elaborate a module and simulate it.
    pub use crate::{
        context::Context,
        error::Error,
        node::{
            clock::ClockPolarity,
            memory::{MemPortKind, Memory, MemoryInit},
            op::Opcode,
            reset::ResetKind,
            Node, NodeKind,
        },
        schedule::CompiledSchedule,
        scope::{ClockScope, ResetScope},
        simulator::{Simulator, SimulatorOptions},
        trace::{NullTrace, TraceSink},
    };
    pub use hwsim_types::{ClockDomainId, NodeId, Sdata};
}
