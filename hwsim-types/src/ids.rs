use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Stable identifier of a node within its owning context.
///
/// Ids are monotonic within one context (assigned in construction order) and are only ever
/// compared for equality across contexts; they are not meaningful outside the context that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw index. Only the owning context should construct these.
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// The raw index, usable to key a `Vec`-backed value store.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Identifies a (clock node, polarity) pair that a set of registers share as their timing
/// reference.
///
/// Domain ids are handed out from a single process-wide counter and are comparable only for
/// equality, never for ordering: there is no meaning to "domain 3 is before domain 7".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockDomainId(u64);

static DOMAIN_COUNTER: OnceLock<AtomicU64> = OnceLock::new();

impl ClockDomainId {
    /// Allocate a fresh, process-wide-unique domain id.
    ///
    /// The backing counter is lazily initialized and never reset; this mirrors the
    /// `std::sync::OnceLock`-backed globals used elsewhere in the ecosystem for this kind of
    /// "assign once, compare forever" id.
    pub fn next() -> Self {
        let counter = DOMAIN_COUNTER.get_or_init(|| AtomicU64::new(0));
        Self(counter.fetch_add(1, Ordering::Relaxed))
    }
}
