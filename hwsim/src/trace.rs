//! The trace sink collaborator interface (`SPEC_FULL.md` §4.8).
//!
//! The core ships no waveform/VCD writer; `TraceSink` is the seam a collaborator attaches to via
//! [`crate::simulator::Simulator::attach_trace`]. [`NullTrace`] is the default so the simulator's
//! hot path never needs an `Option` check to call it.

use hwsim_types::{NodeId, Sdata};

/// Receives every slot write the simulator performs during publish, combinational, and commit.
pub trait TraceSink {
    /// Called once per slot write, in the order it happened within the cycle.
    fn on_slot_write(&mut self, node: NodeId, cycle: u64, value: Sdata);
}

/// A `TraceSink` that discards everything. The simulator's default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_slot_write(&mut self, _node: NodeId, _cycle: u64, _value: Sdata) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<(NodeId, u64, Sdata)>,
    }

    impl TraceSink for Recorder {
        fn on_slot_write(&mut self, node: NodeId, cycle: u64, value: Sdata) {
            self.writes.push((node, cycle, value));
        }
    }

    #[test]
    fn null_trace_drops_everything() {
        let mut sink = NullTrace;
        sink.on_slot_write(NodeId::from_index(0), 0, Sdata::zero(1));
    }

    #[test]
    fn a_real_sink_records_writes() {
        let mut sink = Recorder::default();
        sink.on_slot_write(NodeId::from_index(3), 7, Sdata::new(5, 8));
        assert_eq!(sink.writes, vec![(NodeId::from_index(3), 7, Sdata::new(5, 8))]);
    }
}
