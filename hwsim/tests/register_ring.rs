//! Scenario 6 (`SPEC_FULL.md` §8): two registers in a ring, `a.next = b`, `b.next = a`.

mod common;

use hwsim::prelude::*;

#[test]
fn two_registers_swap_values_every_edge() {
    let mut ctx = Context::new("ring");
    let clock = ctx.create_clock(ClockPolarity::Posedge, "clk", "register_ring.rs");
    let _guard = ctx.scoped_clock(clock);

    let a_init = ctx.create_literal(Sdata::new(0x3, 4), "a_init", "register_ring.rs");
    let b_init = ctx.create_literal(Sdata::new(0xC, 4), "b_init", "register_ring.rs");
    let a = ctx.create_reg(None, None, None, a_init, None, "a", "register_ring.rs").unwrap();
    let b = ctx.create_reg(None, None, None, b_init, None, "b", "register_ring.rs").unwrap();
    ctx.set_next(a, b).unwrap();
    ctx.set_next(b, a).unwrap();
    let schedule = ctx.finalize().unwrap();

    let mut sim = Simulator::new(schedule, SimulatorOptions::default());
    assert_eq!(sim.get(a).bits(), 0x3);
    assert_eq!(sim.get(b).bits(), 0xC);

    let expected = [(0xCu128, 0x3u128), (0x3, 0xC), (0xC, 0x3), (0x3, 0xC)];
    for (i, &(wa, wb)) in expected.iter().enumerate() {
        common::pulse(&mut sim, clock);
        assert_eq!(sim.get(a).bits(), wa, "a at cycle {i}");
        assert_eq!(sim.get(b).bits(), wb, "b at cycle {i}");
    }
}
