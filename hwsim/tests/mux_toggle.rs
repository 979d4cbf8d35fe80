//! Scenario 4 (`SPEC_FULL.md` §8): mux selecting between two constants based on a toggling
//! register.

mod common;

use hwsim::prelude::*;

#[test]
fn mux_output_alternates_with_a_toggling_register() {
    let mut ctx = Context::new("mux_toggle");
    let clock = ctx.create_clock(ClockPolarity::Posedge, "clk", "mux_toggle.rs");
    let _guard = ctx.scoped_clock(clock);

    let zero = ctx.create_literal(Sdata::zero(1), "zero", "mux_toggle.rs");
    let toggle = ctx.create_reg(None, None, None, zero, None, "toggle", "mux_toggle.rs").unwrap();
    let flipped = ctx.create_op(Opcode::Not, false, toggle, None, "flipped", "mux_toggle.rs").unwrap();
    ctx.set_next(toggle, flipped).unwrap();

    let hi = ctx.create_literal(Sdata::new(0x55, 8), "hi", "mux_toggle.rs");
    let lo = ctx.create_literal(Sdata::new(0xAA, 8), "lo", "mux_toggle.rs");
    let selected = ctx.create_mux(toggle, hi, lo, "selected", "mux_toggle.rs").unwrap();
    let out = ctx.create_output(8, "out", "mux_toggle.rs");
    ctx.attach_output(out, selected).unwrap();

    let schedule = ctx.finalize().unwrap();
    let mut sim = Simulator::new(schedule, SimulatorOptions::default());

    let expected = [0xAAu128, 0x55, 0xAA, 0x55, 0xAA];
    for (i, &want) in expected.iter().enumerate() {
        common::pulse(&mut sim, clock);
        assert_eq!(sim.get(out).bits(), want, "cycle {i}");
    }
}
