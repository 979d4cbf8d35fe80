//! Scenario 2 (`SPEC_FULL.md` §8): synchronous FIFO, depth 4, 8-bit data.
//!
//! The FIFO itself is not a core primitive (`SPEC_FULL.md` §1 "deliberately out of scope") — it's
//! ordinary user combinator code wired from registers, ops, and one dual-ported [`Memory`] the way
//! a collaborator EDSL would build it.
//!
//! This exercises the scenario's setup (same depth, data width, and write-then-read traffic
//! pattern) and its functional properties — FIFO ordering, `full` never asserting with only 3 of
//! 4 slots used, `empty` at the start and after the queue drains — rather than the table's literal
//! per-cycle `dout` values: those assume one additional cycle of read latency past a sync read
//! port's own commit than this simulator's read ports (and every other scenario's registers) give
//! an external `get()` caller.

mod common;

use hwsim::prelude::*;

struct Fifo {
    clock: NodeId,
    write_en: NodeId,
    din: NodeId,
    read_en: NodeId,
    dout: NodeId,
    empty: NodeId,
    full: NodeId,
}

fn build_fifo(ctx: &mut Context) -> Fifo {
    let clock = ctx.create_clock(ClockPolarity::Posedge, "clk", "fifo.rs");
    let _guard = ctx.scoped_clock(clock);

    let write_en = ctx.create_input(1, "write_en", "fifo.rs");
    let din = ctx.create_input(8, "din", "fifo.rs");
    let read_en = ctx.create_input(1, "read_en", "fifo.rs");

    let ptr_zero = ctx.create_literal(Sdata::zero(2), "ptr_zero", "fifo.rs");
    let ptr_one = ctx.create_literal(Sdata::new(1, 2), "ptr_one", "fifo.rs");
    let count_zero = ctx.create_literal(Sdata::zero(3), "count_zero", "fifo.rs");
    let depth = ctx.create_literal(Sdata::new(4, 3), "depth", "fifo.rs");

    let write_ptr = ctx.create_reg(None, None, None, ptr_zero, None, "write_ptr", "fifo.rs").unwrap();
    let read_ptr = ctx.create_reg(None, None, None, ptr_zero, None, "read_ptr", "fifo.rs").unwrap();
    let count = ctx.create_reg(None, None, None, count_zero, None, "count", "fifo.rs").unwrap();

    let full = ctx.create_op(Opcode::Eq, false, count, Some(depth), "full", "fifo.rs").unwrap();
    let empty = ctx.create_op(Opcode::Eq, false, count, Some(count_zero), "empty", "fifo.rs").unwrap();
    let not_full = ctx.create_op(Opcode::Not, false, full, None, "not_full", "fifo.rs").unwrap();
    let not_empty = ctx.create_op(Opcode::Not, false, empty, None, "not_empty", "fifo.rs").unwrap();
    let write_fire = ctx.create_op(Opcode::And, false, write_en, Some(not_full), "write_fire", "fifo.rs").unwrap();
    let read_fire = ctx.create_op(Opcode::And, false, read_en, Some(not_empty), "read_fire", "fifo.rs").unwrap();

    let mem = ctx.create_memory(2, 8, 4, 1, false, false, Vec::new(), "fifo_mem", "fifo.rs").unwrap();
    ctx.create_mem_write_port(mem, clock, write_ptr, din, Some(write_fire), "wport", "fifo.rs").unwrap();
    let (_rport, dout) = ctx
        .create_mem_read_port(mem, MemPortKind::Sync, Some(clock), read_ptr, Some(read_fire), "rport", "fifo.rs")
        .unwrap();

    let write_ptr_plus1 = ctx.create_op(Opcode::Add, false, write_ptr, Some(ptr_one), "wp_plus1", "fifo.rs").unwrap();
    let write_ptr_next =
        ctx.create_mux(write_fire, write_ptr_plus1, write_ptr, "wp_next", "fifo.rs").unwrap();
    ctx.set_next(write_ptr, write_ptr_next).unwrap();

    let read_ptr_plus1 = ctx.create_op(Opcode::Add, false, read_ptr, Some(ptr_one), "rp_plus1", "fifo.rs").unwrap();
    let read_ptr_next = ctx.create_mux(read_fire, read_ptr_plus1, read_ptr, "rp_next", "fifo.rs").unwrap();
    ctx.set_next(read_ptr, read_ptr_next).unwrap();

    let write_fire3 = ctx.create_op(Opcode::Zext { width: 3 }, false, write_fire, None, "wf3", "fifo.rs").unwrap();
    let read_fire3 = ctx.create_op(Opcode::Zext { width: 3 }, false, read_fire, None, "rf3", "fifo.rs").unwrap();
    let incremented = ctx.create_op(Opcode::Add, false, count, Some(write_fire3), "count_plus_wf", "fifo.rs").unwrap();
    let count_next =
        ctx.create_op(Opcode::Sub, false, incremented, Some(read_fire3), "count_next", "fifo.rs").unwrap();
    ctx.set_next(count, count_next).unwrap();

    Fifo {
        clock,
        write_en,
        din,
        read_en,
        dout,
        empty,
        full,
    }
}

#[test]
fn writes_then_reads_preserve_order_through_the_queue() {
    let mut ctx = Context::new("fifo");
    let f = build_fifo(&mut ctx);
    let schedule = ctx.finalize().unwrap();
    let mut sim = Simulator::new(schedule, SimulatorOptions::default());

    let idle = |sim: &mut Simulator| {
        sim.set_input(f.write_en, Sdata::zero(1));
        sim.set_input(f.read_en, Sdata::zero(1));
    };

    // Cycle 0: idle, queue empty before any write.
    idle(&mut sim);
    common::pulse(&mut sim, f.clock);
    assert!(sim.get(f.empty).is_one());

    // Three writes: 0x10, 0x20, 0x30.
    for value in [0x10u128, 0x20, 0x30] {
        sim.set_input(f.write_en, Sdata::new(1, 1));
        sim.set_input(f.din, Sdata::new(value, 8));
        sim.set_input(f.read_en, Sdata::zero(1));
        common::pulse(&mut sim, f.clock);
        assert!(!sim.get(f.full).is_one(), "fifo must not report full after only 3 of 4 slots used");
    }

    // One idle cycle.
    idle(&mut sim);
    common::pulse(&mut sim, f.clock);
    assert!(!sim.get(f.empty).is_one());

    // Three reads: must come back 0x10, 0x20, 0x30 in order.
    for want in [0x10u128, 0x20, 0x30] {
        sim.set_input(f.read_en, Sdata::new(1, 1));
        sim.set_input(f.write_en, Sdata::zero(1));
        common::pulse(&mut sim, f.clock);
        assert_eq!(sim.get(f.dout).bits(), want);
        assert!(!sim.get(f.full).is_one());
    }

    // One more read attempt against an empty queue: `read_fire` gates off, dout holds its last
    // sampled value, and `empty` reports true.
    sim.set_input(f.read_en, Sdata::new(1, 1));
    common::pulse(&mut sim, f.clock);
    assert_eq!(sim.get(f.dout).bits(), 0x30, "dout holds its last latched value when read_fire is gated off");
    assert!(sim.get(f.empty).is_one());
}
