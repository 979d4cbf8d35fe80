//! Scenario 5 (`SPEC_FULL.md` §8): depth-4 ROM, async read, no clock involved at all.

use hwsim::prelude::*;

#[test]
fn async_read_reflects_the_current_address_combinationally() {
    let mut ctx = Context::new("rom");
    let init = vec![
        Sdata::new(0xDEAD, 16),
        Sdata::new(0xBEEF, 16),
        Sdata::new(0xCAFE, 16),
        Sdata::new(0xBABE, 16),
    ];
    let mem = ctx.create_memory(2, 16, 4, 1, false, true, init, "rom", "rom.rs").unwrap();
    let addr = ctx.create_input(2, "addr", "rom.rs");
    let (_port, data) = ctx
        .create_mem_read_port(mem, MemPortKind::Async, None, addr, None, "rd", "rom.rs")
        .unwrap();
    let out = ctx.create_output(16, "dout", "rom.rs");
    ctx.attach_output(out, data).unwrap();
    let schedule = ctx.finalize().unwrap();

    let mut sim = Simulator::new(schedule, SimulatorOptions::default());
    let addresses = [0u128, 1, 2, 3, 0];
    let want = [0xDEADu128, 0xBEEF, 0xCAFE, 0xBABE, 0xDEAD];
    for (&a, &expected) in addresses.iter().zip(want.iter()) {
        sim.set_input(addr, Sdata::new(a, 2));
        sim.tick().unwrap();
        assert_eq!(sim.get(out).bits(), expected);
    }
}

#[test]
fn a_rom_rejects_a_write_port() {
    let mut ctx = Context::new("rom_write_rejected");
    let mem = ctx.create_memory(2, 16, 4, 1, false, true, Vec::new(), "rom", "rom.rs").unwrap();
    let clock = ctx.create_clock(ClockPolarity::Posedge, "clk", "rom.rs");
    let addr = ctx.create_input(2, "addr", "rom.rs");
    let wdata = ctx.create_input(16, "wdata", "rom.rs");
    let err = ctx.create_mem_write_port(mem, clock, addr, wdata, None, "wport", "rom.rs").unwrap_err();
    assert!(matches!(err, Error::InvalidEdge { .. }));
}
