//! Shared driving helper for the scenario-level integration tests (`SPEC_FULL.md` §8).
//!
//! Every scenario clock is free-running and single-polarity (`Posedge`). One "scenario cycle" is
//! one full low->high pulse: two `tick()` calls, asserted against only after the rising one, so
//! each cycle produces exactly one register-committing edge.

use hwsim::prelude::*;

/// Drive `clock` low, tick, then high, tick — one posedge per call.
pub fn pulse(sim: &mut Simulator, clock: NodeId) {
    sim.set_input(clock, Sdata::zero(1));
    sim.tick().unwrap();
    sim.set_input(clock, Sdata::new(1, 1));
    sim.tick().unwrap();
}
