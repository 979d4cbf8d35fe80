//! Structured errors surfaced by elaboration, finalize, and structural edits.
//!
//! Every fallible entry point in [`crate::context::Context`] and [`crate::schedule`] returns
//! `Result<T, Error>`. Each variant carries the node id(s), human names, and source locations
//! involved so the caller can display the error without walking the graph again.

use hwsim_types::{NodeId, WidthError};

/// The error taxonomy for elaboration and finalize, per `SPEC_FULL.md` §7.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// An op/mux/register source width violated the kind's width rule.
    #[error("width mismatch building `{name}` ({loc}): {source}")]
    WidthMismatch {
        /// Name of the node under construction.
        name: String,
        /// Source location of the construction call.
        loc: String,
        /// The underlying width rule violation.
        #[source]
        source: WidthError,
    },

    /// A source edge referenced a node outside the owning context, or a write port was
    /// attached to a ROM.
    #[error("invalid edge: {reason} (at `{name}`, {loc})")]
    InvalidEdge {
        /// What made the edge invalid.
        reason: String,
        /// Name of the node under construction.
        name: String,
        /// Source location of the construction call.
        loc: String,
    },

    /// `finalize` found a cycle among combinational-only nodes.
    #[error("combinational cycle detected through node {node} (`{name}`)")]
    CombinationalCycle {
        /// One node on the cycle.
        node: NodeId,
        /// That node's human name.
        name: String,
    },

    /// A register had no next-value source bound at `finalize` time.
    #[error("register `{name}` ({node}) has no bound next-value source")]
    UnboundNext {
        /// The unbound register.
        node: NodeId,
        /// That register's human name.
        name: String,
    },

    /// A memory `init` entry was wider than the memory's `data_width`.
    #[error("init entry {index} for memory `{name}` is wider than data_width ({data_width} bits)")]
    InitOverflow {
        /// Index into the init list of the offending entry.
        index: usize,
        /// Name of the memory.
        name: String,
        /// The memory's configured data width.
        data_width: u32,
    },

    /// `Register::set_next` (or an equivalent structural edit) was called a second time on the
    /// same register.
    #[error("register `{name}` ({node}) already has a bound next-value source")]
    NextAlreadyBound {
        /// The register.
        node: NodeId,
        /// That register's human name.
        name: String,
    },

    /// A structural edit (`set_src`, `remove_port`, …) referenced an edge index or port id that
    /// does not exist on the target node.
    #[error("no such {what} {index} on node `{name}` ({node})")]
    NoSuchEdge {
        /// What kind of index was out of range (`"source edge"`, `"port"`, …).
        what: &'static str,
        /// The offending index.
        index: usize,
        /// Name of the node being edited.
        name: String,
        /// The node being edited.
        node: NodeId,
    },

    /// A runtime memory access addressed past `depth`, and
    /// `SimulatorOptions::stop_on_address_out_of_range` was set. By default this is a graceful
    /// degradation (wrap-around for reads, dropped write), not an error; see `SPEC_FULL.md` §7.
    #[error("address {address} out of range for memory `{name}` ({node}) with depth {depth}")]
    AddressOutOfRange {
        /// The memory node.
        node: NodeId,
        /// That memory's human name.
        name: String,
        /// The offending address.
        address: u128,
        /// The memory's configured depth.
        depth: u32,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
