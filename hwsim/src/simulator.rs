//! The cycle-accurate driver (`SPEC_FULL.md` §4.7).
//!
//! `Simulator` owns the mutable runtime state a [`crate::schedule::CompiledSchedule`] doesn't:
//! the live value store, register/memory state, per-clock previous values for edge detection, and
//! the attached trace sink. `tick()` is the only place cycle time advances.

use std::collections::HashMap;

use hwsim_types::{ClockDomainId, NodeId, Sdata};

use crate::{
    error::{Error, Result},
    node::{
        clock::ClockPolarity,
        memory::MemPortKind,
        MemReadPortNode, MemWritePortNode, Node, NodeKind, RegisterNode,
    },
    schedule::CompiledSchedule,
    trace::{NullTrace, TraceSink},
};

/// Construction-time knobs for a [`Simulator`] (`SPEC_FULL.md` §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimulatorOptions {
    /// When `true`, an out-of-range memory address is a hard [`Error::AddressOutOfRange`]
    /// instead of the default graceful degradation (wrap-around reads, dropped writes).
    pub stop_on_address_out_of_range: bool,
}

/// Runtime state bound to one finalized context.
pub struct Simulator {
    schedule: CompiledSchedule,
    options: SimulatorOptions,
    values: Vec<Sdata>,
    staged_inputs: HashMap<NodeId, Sdata>,
    register_current: HashMap<NodeId, Sdata>,
    register_initial: HashMap<NodeId, Sdata>,
    memory_state: HashMap<NodeId, Vec<Sdata>>,
    sync_latched: HashMap<NodeId, Sdata>,
    clock_prev: HashMap<NodeId, Sdata>,
    cycle: u64,
    trace: Box<dyn TraceSink>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("cycle", &self.cycle)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Build a runtime bound to `schedule`, with state initialized as if by [`Simulator::reset_state`].
    pub fn new(schedule: CompiledSchedule, options: SimulatorOptions) -> Self {
        let len = schedule.nodes().len();
        let mut sim = Self {
            schedule,
            options,
            values: vec![Sdata::zero(1); len],
            staged_inputs: HashMap::new(),
            register_current: HashMap::new(),
            register_initial: HashMap::new(),
            memory_state: HashMap::new(),
            sync_latched: HashMap::new(),
            clock_prev: HashMap::new(),
            cycle: 0,
            trace: Box::new(NullTrace),
        };
        sim.reset_state();
        sim
    }

    /// The compiled schedule this runtime is bound to.
    pub fn schedule(&self) -> &CompiledSchedule {
        &self.schedule
    }

    /// The number of completed `tick()` calls since construction or the last `reset_state()`.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Stage a value for an input, clock, or reset node to take effect on the next `tick()`.
    pub fn set_input(&mut self, node: NodeId, value: Sdata) {
        self.staged_inputs.insert(node, value);
    }

    /// The current value of any node's slot.
    pub fn get(&self, node: NodeId) -> Sdata {
        self.values[node.index()]
    }

    /// Reinitialize every register and memory to its elaboration-time initial contents, clear
    /// staged inputs, and reset the cycle counter to 0.
    pub fn reset_state(&mut self) {
        for node in self.schedule.nodes() {
            self.values[node.id().index()] = match node.kind() {
                NodeKind::Literal(l) => l.value,
                _ => Sdata::zero(node.width()),
            };
        }

        self.memory_state.clear();
        self.clock_prev.clear();
        for node in self.schedule.nodes() {
            match node.kind() {
                NodeKind::Memory(m) => {
                    self.memory_state.insert(node.id(), m.init().to_vec());
                }
                NodeKind::Clock(_) => {
                    self.clock_prev.insert(node.id(), Sdata::zero(1));
                }
                _ => {}
            }
        }

        self.sync_latched.clear();
        for &port in self.schedule.sync_read_ports() {
            let width = self.schedule.node(port).width();
            self.sync_latched.insert(port, Sdata::zero(width));
        }

        self.register_initial.clear();
        self.register_current.clear();
        for &reg in self.schedule.registers() {
            let init_src = self
                .schedule
                .node(reg)
                .source_slot(RegisterNode::SLOT_INITIAL)
                .expect("register always binds an initial-value source at construction");
            let value = const_fold(self.schedule.nodes(), init_src);
            self.register_initial.insert(reg, value);
            self.register_current.insert(reg, value);
        }

        self.staged_inputs.clear();
        self.cycle = 0;
    }

    /// Attach a trace sink that receives every slot write from here on.
    pub fn attach_trace(&mut self, sink: Box<dyn TraceSink>) {
        self.trace = sink;
    }

    /// Detach the current trace sink, reverting to [`NullTrace`].
    pub fn detach_trace(&mut self) {
        self.trace = Box::new(NullTrace);
    }

    /// Advance one cycle: sample inputs, publish register/sync-read state, evaluate the
    /// combinational schedule, then commit registers, sync reads, and memory writes in that order.
    #[tracing::instrument(skip(self), fields(cycle = self.cycle))]
    pub fn tick(&mut self) -> Result<()> {
        let cycle = self.cycle;

        let staged: Vec<(NodeId, Sdata)> = self.staged_inputs.drain().collect();
        for (id, value) in staged {
            self.values[id.index()] = value;
            self.trace.on_slot_write(id, cycle, value);
        }

        for &reg in self.schedule.registers() {
            let value = self.register_current[&reg];
            self.values[reg.index()] = value;
            self.trace.on_slot_write(reg, cycle, value);
        }
        for &port in self.schedule.sync_read_ports() {
            let value = self.sync_latched[&port];
            self.values[port.index()] = value;
            self.trace.on_slot_write(port, cycle, value);
        }

        let combinational: Vec<NodeId> = self.schedule.combinational().to_vec();
        for id in combinational {
            let value = self.eval_combinational(id)?;
            self.values[id.index()] = value;
            self.trace.on_slot_write(id, cycle, value);
        }

        self.commit_registers();
        self.sample_sync_reads(cycle)?;
        self.commit_writes()?;

        for node in self.schedule.nodes() {
            if matches!(node.kind(), NodeKind::Clock(_)) {
                let id = node.id();
                self.clock_prev.insert(id, self.values[id.index()]);
            }
        }

        self.cycle += 1;
        Ok(())
    }

    fn eval_combinational(&self, id: NodeId) -> Result<Sdata> {
        let node = self.schedule.node(id);
        match node.kind() {
            NodeKind::Input | NodeKind::Output | NodeKind::Proxy => {
                let src = node
                    .source_slot(0)
                    .expect("scheduled input/output/proxy always has its source bound");
                Ok(self.values[src.index()])
            }
            NodeKind::Op(op) => {
                let lhs = self.values[node
                    .source_slot(0)
                    .expect("op node always has an lhs")
                    .index()];
                let rhs = node.source_slot(1).map(|s| self.values[s.index()]);
                Ok(op.opcode.eval(op.signed, &lhs, rhs.as_ref()))
            }
            NodeKind::Mux => {
                let cond = self.values[node.source_slot(0).expect("mux always has a cond").index()];
                let branch = if cond.is_one() { 1 } else { 2 };
                let src = node.source_slot(branch).expect("mux always has t/f bound");
                Ok(self.values[src.index()])
            }
            NodeKind::MemReadPort(p) if p.port_kind == MemPortKind::Async => {
                let enabled = node
                    .source_slot(MemReadPortNode::SLOT_ENABLE)
                    .map(|s| self.values[s.index()].is_one())
                    .unwrap_or(true);
                if !enabled {
                    return Ok(Sdata::zero(node.width()));
                }
                let addr = self.values[node
                    .source_slot(MemReadPortNode::SLOT_ADDR)
                    .expect("read port always has an addr")
                    .index()];
                self.memory_word(p.parent, addr)
            }
            other => unreachable!("node kind {other:?} should not be in the combinational schedule"),
        }
    }

    fn memory_word(&self, mem: NodeId, addr: Sdata) -> Result<Sdata> {
        let memory = match self.schedule.node(mem).kind() {
            NodeKind::Memory(m) => m,
            _ => unreachable!("a read/write port's parent is always a memory node"),
        };
        let depth = memory.depth();
        let addr_val = addr.bits();
        let index = if addr_val < depth as u128 {
            addr_val as usize
        } else if self.options.stop_on_address_out_of_range {
            return Err(Error::AddressOutOfRange {
                node: mem,
                name: self.schedule.node(mem).name().to_string(),
                address: addr_val,
                depth,
            });
        } else {
            tracing::warn!(
                memory = self.schedule.node(mem).name(),
                address = %addr_val,
                depth,
                "memory read address out of range, wrapping"
            );
            (addr_val % depth as u128) as usize
        };
        Ok(self.memory_state[&mem][index])
    }

    fn commit_registers(&mut self) {
        let registers: Vec<NodeId> = self.schedule.registers().to_vec();
        for reg in registers {
            let domain = match self.schedule.node(reg).kind() {
                NodeKind::Register(r) => r.domain,
                _ => unreachable!("schedule.registers() only lists register nodes"),
            };
            let edge = self.clock_edge_fired(domain);

            let reset_slot = self.schedule.node(reg).source_slot(RegisterNode::SLOT_RESET);
            let reset_kind = reset_slot.map(|r| match self.schedule.node(r).kind() {
                NodeKind::Reset(rn) => rn.kind,
                _ => unreachable!("a register's reset slot always references a reset node"),
            });
            let reset_asserted = match (reset_slot, reset_kind) {
                (Some(rs), Some(kind)) => kind.is_asserted(&self.values[rs.index()]),
                _ => false,
            };
            let is_async = reset_kind.map(|k| k.is_async()).unwrap_or(false);

            let new_value = if is_async && reset_asserted {
                Some(self.reset_value_for(reg))
            } else if edge {
                if reset_asserted {
                    Some(self.reset_value_for(reg))
                } else {
                    let clock_enable = self
                        .schedule
                        .node(reg)
                        .source_slot(RegisterNode::SLOT_CLOCK_ENABLE)
                        .map(|s| self.values[s.index()].is_one())
                        .unwrap_or(true);
                    if clock_enable {
                        let next = self
                            .schedule
                            .node(reg)
                            .source_slot(RegisterNode::SLOT_NEXT)
                            .expect("finalize rejects registers with an unbound next source");
                        Some(self.values[next.index()])
                    } else {
                        None
                    }
                }
            } else {
                None
            };

            if let Some(value) = new_value {
                self.register_current.insert(reg, value);
                // A register's committed value is visible to an external `get()` caller right
                // away, same as a testbench probe on Q: only other *combinational* nodes are
                // bound by the publish-before-combinational cut-point discipline.
                self.values[reg.index()] = value;
                self.trace.on_slot_write(reg, self.cycle, value);
            }
        }
    }

    fn reset_value_for(&self, reg: NodeId) -> Sdata {
        match self.schedule.node(reg).source_slot(RegisterNode::SLOT_RESET_VALUE) {
            Some(s) => self.values[s.index()],
            None => self.register_initial[&reg],
        }
    }

    fn clock_edge_fired(&self, domain: ClockDomainId) -> bool {
        match self.schedule.domain_clock(domain) {
            Some((clock_id, polarity)) => self.edge_fires_on(clock_id, polarity),
            None => false,
        }
    }

    fn edge_fires_on(&self, clock: NodeId, polarity: ClockPolarity) -> bool {
        let prev = self.clock_prev[&clock];
        let current = self.values[clock.index()];
        polarity.edge_fires(&prev, &current)
    }

    fn sample_sync_reads(&mut self, cycle: u64) -> Result<()> {
        let ports: Vec<NodeId> = self.schedule.sync_read_ports().to_vec();
        for port in ports {
            let parent = match self.schedule.node(port).kind() {
                NodeKind::MemReadPort(p) => p.parent,
                _ => unreachable!("schedule.sync_read_ports() only lists read ports"),
            };
            let clock_slot = self
                .schedule
                .node(port)
                .source_slot(MemReadPortNode::SLOT_CLOCK)
                .expect("a sync read port always binds a clock edge");
            let polarity = match self.schedule.node(clock_slot).kind() {
                NodeKind::Clock(c) => c.polarity,
                _ => unreachable!("a read port's clock slot always references a clock node"),
            };
            if !self.edge_fires_on(clock_slot, polarity) {
                continue;
            }
            let enabled = self
                .schedule
                .node(port)
                .source_slot(MemReadPortNode::SLOT_ENABLE)
                .map(|s| self.values[s.index()].is_one())
                .unwrap_or(true);
            if !enabled {
                continue;
            }
            let addr_slot = self
                .schedule
                .node(port)
                .source_slot(MemReadPortNode::SLOT_ADDR)
                .expect("a sync read port always has an addr");
            let addr = self.values[addr_slot.index()];
            let value = self.memory_word(parent, addr)?;
            self.sync_latched.insert(port, value);
            self.values[port.index()] = value;
            self.trace.on_slot_write(port, cycle, value);
            tracing::trace!(port = %port, cycle, "sync read sampled");
        }
        Ok(())
    }

    fn commit_writes(&mut self) -> Result<()> {
        let memories: Vec<NodeId> = self
            .schedule
            .nodes()
            .iter()
            .filter(|n| matches!(n.kind(), NodeKind::Memory(_)))
            .map(Node::id)
            .collect();

        for mem in memories {
            let (write_ports, lane_width, byte_enable, depth, is_rom) = match self.schedule.node(mem).kind() {
                NodeKind::Memory(m) => (
                    m.write_ports().to_vec(),
                    m.lane_width(),
                    m.has_byte_enable(),
                    m.depth(),
                    m.is_rom(),
                ),
                _ => unreachable!(),
            };
            if is_rom {
                continue;
            }

            for port in write_ports {
                let (clock_slot, addr_slot, wdata_slot, enable_slot) = match self.schedule.node(port).kind() {
                    NodeKind::MemWritePort(_) => (
                        self.schedule
                            .node(port)
                            .source_slot(MemWritePortNode::SLOT_CLOCK)
                            .expect("a write port always binds a clock"),
                        self.schedule
                            .node(port)
                            .source_slot(MemWritePortNode::SLOT_ADDR)
                            .expect("a write port always has an addr"),
                        self.schedule
                            .node(port)
                            .source_slot(MemWritePortNode::SLOT_WDATA)
                            .expect("a write port always has wdata"),
                        self.schedule.node(port).source_slot(MemWritePortNode::SLOT_ENABLE),
                    ),
                    _ => unreachable!(),
                };

                let polarity = match self.schedule.node(clock_slot).kind() {
                    NodeKind::Clock(c) => c.polarity,
                    _ => unreachable!(),
                };
                if !self.edge_fires_on(clock_slot, polarity) {
                    continue;
                }

                let enabled_whole = byte_enable
                    || enable_slot.map(|s| self.values[s.index()].is_one()).unwrap_or(true);
                if !enabled_whole {
                    continue;
                }

                let addr = self.values[addr_slot.index()];
                let wdata = self.values[wdata_slot.index()];
                let addr_val = addr.bits();
                let index = if addr_val < depth as u128 {
                    addr_val as usize
                } else if self.options.stop_on_address_out_of_range {
                    return Err(Error::AddressOutOfRange {
                        node: mem,
                        name: self.schedule.node(mem).name().to_string(),
                        address: addr_val,
                        depth,
                    });
                } else {
                    tracing::warn!(
                        memory = self.schedule.node(mem).name(),
                        address = %addr_val,
                        depth,
                        "write address out of range, dropped"
                    );
                    continue;
                };

                self.apply_write(mem, index, wdata, enable_slot, byte_enable, lane_width);
            }
        }
        Ok(())
    }

    fn apply_write(
        &mut self,
        mem: NodeId,
        index: usize,
        wdata: Sdata,
        enable_slot: Option<NodeId>,
        byte_enable: bool,
        lane_width: u32,
    ) {
        if byte_enable {
            let lanes = wdata.width() / lane_width;
            let mut word = self.memory_state[&mem][index];
            for lane in 0..lanes {
                let lane_enabled = enable_slot.map(|s| self.values[s.index()].get_bit(lane)).unwrap_or(true);
                if !lane_enabled {
                    continue;
                }
                let lo = lane * lane_width;
                for bit in 0..lane_width {
                    word.set_bit(lo + bit, wdata.get_bit(lo + bit));
                }
            }
            self.memory_state.get_mut(&mem).expect("memory state always present after reset_state")[index] = word;
        } else {
            self.memory_state.get_mut(&mem).expect("memory state always present after reset_state")[index] = wdata;
        }
    }
}

/// Evaluate a node's elaboration-time constant value, used to seed a register's `current` at
/// `reset_state`. Only literals, proxies, ops, and muxes are foldable; anything reachable through
/// a register, memory port, or unwired input/clock/reset folds to zero — initial-value
/// expressions are expected to be elaboration-time constants, which every scenario in
/// `SPEC_FULL.md` §8 satisfies.
fn const_fold(nodes: &[Node], id: NodeId) -> Sdata {
    let mut cache = HashMap::new();
    const_fold_rec(nodes, id, &mut cache)
}

fn const_fold_rec(nodes: &[Node], id: NodeId, cache: &mut HashMap<NodeId, Sdata>) -> Sdata {
    if let Some(value) = cache.get(&id) {
        return *value;
    }
    let node = &nodes[id.index()];
    let value = match node.kind() {
        NodeKind::Literal(l) => l.value,
        NodeKind::Proxy => node
            .source_slot(0)
            .map(|s| const_fold_rec(nodes, s, cache))
            .unwrap_or_else(|| Sdata::zero(node.width())),
        NodeKind::Op(op) => {
            let lhs = node
                .source_slot(0)
                .map(|s| const_fold_rec(nodes, s, cache))
                .unwrap_or_else(|| Sdata::zero(node.width()));
            let rhs = node.source_slot(1).map(|s| const_fold_rec(nodes, s, cache));
            op.opcode.eval(op.signed, &lhs, rhs.as_ref())
        }
        NodeKind::Mux => {
            let cond = node
                .source_slot(0)
                .map(|s| const_fold_rec(nodes, s, cache))
                .unwrap_or_else(|| Sdata::zero(1));
            let branch = if cond.is_one() { 1 } else { 2 };
            node.source_slot(branch)
                .map(|s| const_fold_rec(nodes, s, cache))
                .unwrap_or_else(|| Sdata::zero(node.width()))
        }
        _ => Sdata::zero(node.width()),
    };
    cache.insert(id, value);
    value
}
