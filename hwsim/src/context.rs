//! The per-module IR graph and its node factory (`SPEC_FULL.md` §4.1).
//!
//! A `Context` owns every [`Node`] built during elaboration of one module instance. Node ids are
//! handed out in construction order and are stable for the context's lifetime; nodes never move
//! and are never deleted, even when a port is "removed" (`SPEC_FULL.md` §3.4) — removal only
//! unregisters the port from its parent memory's port lists, which is what the scheduler and
//! simulator actually consult.

use std::collections::HashMap;

use hwsim_types::{NodeId, Sdata};

use crate::{
    error::{Error, Result},
    node::{
        clock::ClockPolarity,
        memory::{MemPortKind, Memory, MemoryInit},
        op::{Arity, Opcode},
        reset::ResetKind,
        ClockNode, LiteralNode, MemReadPortNode, MemWritePortNode, Node, NodeKind, OpNode,
        RegisterNode, ResetNode,
    },
    schedule::{self, CompiledSchedule},
    scope::{self, ClockScope, ResetScope},
};

/// Owns the IR graph for one module instance.
#[derive(Debug)]
pub struct Context {
    name: String,
    nodes: Vec<Node>,
    literal_index: HashMap<Sdata, NodeId>,
}

impl Context {
    /// Start a new, empty context.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            literal_index: HashMap::new(),
        }
    }

    /// This context's name, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a node by id.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this context — every `NodeId` a caller holds was handed
    /// back by one of this context's own factory methods, so this is an internal-invariant
    /// panic, not a caller-input error.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Every node in construction order. Used by the scheduler.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    fn alloc(&mut self, width: u32, name: &str, loc: &str, sources: Vec<Option<NodeId>>, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, width, name, loc, sources, kind));
        id
    }

    /// Create a constant node. Literals with an identical value are deduplicated: a second call
    /// with an equal `Sdata` returns the first call's id rather than allocating a new node.
    pub fn create_literal(&mut self, value: Sdata, name: &str, loc: &str) -> NodeId {
        if let Some(existing) = self.literal_index.get(&value) {
            return *existing;
        }
        let width = value.width();
        let id = self.alloc(width, name, loc, Vec::new(), NodeKind::Literal(LiteralNode { value }));
        self.literal_index.insert(value, id);
        id
    }

    /// Create an unwired input. Call [`Context::bind_input_driver`] to attach an outer driver, or
    /// leave it unwired and drive it from outside the simulation loop via `Simulator::set_input`.
    pub fn create_input(&mut self, width: u32, name: &str, loc: &str) -> NodeId {
        self.alloc(width, name, loc, vec![None], NodeKind::Input)
    }

    /// Wire an outer driver onto a previously created input.
    pub fn bind_input_driver(&mut self, input: NodeId, driver: NodeId) -> Result<()> {
        let (name, loc) = (self.node(input).name().to_string(), self.node(input).loc().to_string());
        self.require_equal_width(input, driver, &name, &loc)?;
        self.node_mut(input).set_source_slot(0, driver);
        Ok(())
    }

    /// Create an output node. Call [`Context::attach_output`] to wire its source.
    pub fn create_output(&mut self, width: u32, name: &str, loc: &str) -> NodeId {
        self.alloc(width, name, loc, vec![None], NodeKind::Output)
    }

    /// Attach a source to a previously created output.
    pub fn attach_output(&mut self, output: NodeId, source: NodeId) -> Result<()> {
        let (name, loc) = (self.node(output).name().to_string(), self.node(output).loc().to_string());
        self.require_equal_width(output, source, &name, &loc)?;
        self.node_mut(output).set_source_slot(0, source);
        Ok(())
    }

    /// Create a clock input with the given active edge polarity. A fresh [`ClockDomainId`] is
    /// minted for it; every register built under it (see [`Context::push_clock`]) shares that id.
    pub fn create_clock(&mut self, polarity: ClockPolarity, name: &str, loc: &str) -> NodeId {
        let domain = hwsim_types::ClockDomainId::next();
        self.alloc(1, name, loc, Vec::new(), NodeKind::Clock(ClockNode { polarity, domain }))
    }

    /// Create a reset input of the given taxonomy.
    pub fn create_reset(&mut self, kind: ResetKind, name: &str, loc: &str) -> NodeId {
        self.alloc(1, name, loc, Vec::new(), NodeKind::Reset(ResetNode { kind }))
    }

    /// Create a combinational operator node.
    pub fn create_op(
        &mut self,
        opcode: Opcode,
        signed: bool,
        lhs: NodeId,
        rhs: Option<NodeId>,
        name: &str,
        loc: &str,
    ) -> Result<NodeId> {
        let lhs_width = self.node(lhs).width();
        let rhs_width = rhs.map(|r| self.node(r).width());

        match opcode.arity() {
            Arity::Binary if rhs.is_none() => {
                return Err(Error::InvalidEdge {
                    reason: format!("{opcode} requires two operands"),
                    name: name.to_string(),
                    loc: loc.to_string(),
                })
            }
            Arity::Unary if rhs.is_some() => {
                return Err(Error::InvalidEdge {
                    reason: format!("{opcode} takes a single operand"),
                    name: name.to_string(),
                    loc: loc.to_string(),
                })
            }
            _ => {}
        }

        if requires_equal_operand_width(opcode) {
            if let Some(rw) = rhs_width {
                if rw != lhs_width {
                    return Err(Error::WidthMismatch {
                        name: name.to_string(),
                        loc: loc.to_string(),
                        source: hwsim_types::WidthError::mismatch(lhs_width, rw),
                    });
                }
            }
        }

        if let Opcode::Extract { lo, hi } = opcode {
            if lo > hi || hi >= lhs_width {
                return Err(Error::WidthMismatch {
                    name: name.to_string(),
                    loc: loc.to_string(),
                    source: hwsim_types::WidthError::OutOfRange { lo, hi, width: lhs_width },
                });
            }
        }
        if let Opcode::BitSel { index } = opcode {
            if index >= lhs_width {
                return Err(Error::WidthMismatch {
                    name: name.to_string(),
                    loc: loc.to_string(),
                    source: hwsim_types::WidthError::OutOfRange { lo: index, hi: index, width: lhs_width },
                });
            }
        }
        if let Opcode::Sext { width } | Opcode::Zext { width } = opcode {
            if width < lhs_width {
                return Err(Error::WidthMismatch {
                    name: name.to_string(),
                    loc: loc.to_string(),
                    source: hwsim_types::WidthError::mismatch(width, lhs_width),
                });
            }
        }

        let width = opcode.result_width(lhs_width, rhs_width);
        let sources = match opcode.arity() {
            Arity::Unary => vec![Some(lhs)],
            Arity::Binary => vec![Some(lhs), rhs],
        };
        Ok(self.alloc(width, name, loc, sources, NodeKind::Op(OpNode { opcode, signed })))
    }

    /// Create a 2:1 multiplexer. `cond` must be width 1; `t` and `f` must share a width, which
    /// becomes the mux's own width.
    pub fn create_mux(&mut self, cond: NodeId, t: NodeId, f: NodeId, name: &str, loc: &str) -> Result<NodeId> {
        let cond_width = self.node(cond).width();
        if cond_width != 1 {
            return Err(Error::WidthMismatch {
                name: name.to_string(),
                loc: loc.to_string(),
                source: hwsim_types::WidthError::mismatch(1, cond_width),
            });
        }
        let (tw, fw) = (self.node(t).width(), self.node(f).width());
        if tw != fw {
            return Err(Error::WidthMismatch {
                name: name.to_string(),
                loc: loc.to_string(),
                source: hwsim_types::WidthError::mismatch(tw, fw),
            });
        }
        Ok(self.alloc(tw, name, loc, vec![Some(cond), Some(t), Some(f)], NodeKind::Mux))
    }

    /// Create a register. `next` may be left unset and bound later via [`Context::set_next`].
    /// The register's clock domain is taken from the ambient clock (see [`Context::push_clock`]);
    /// its width is the width of `initial_value`.
    pub fn create_reg(
        &mut self,
        reset: Option<NodeId>,
        clock_enable: Option<NodeId>,
        reset_value: Option<NodeId>,
        initial_value: NodeId,
        next: Option<NodeId>,
        name: &str,
        loc: &str,
    ) -> Result<NodeId> {
        let clock = self.current_clock().ok_or_else(|| Error::InvalidEdge {
            reason: "no clock in scope; push_clock before creating a register".to_string(),
            name: name.to_string(),
            loc: loc.to_string(),
        })?;
        let domain = match self.node(clock).kind() {
            NodeKind::Clock(c) => c.domain,
            _ => {
                return Err(Error::InvalidEdge {
                    reason: "ambient clock does not refer to a clock node".to_string(),
                    name: name.to_string(),
                    loc: loc.to_string(),
                })
            }
        };

        let width = self.node(initial_value).width();
        for (label, candidate) in [("next", next), ("reset_value", reset_value)] {
            if let Some(node) = candidate {
                let w = self.node(node).width();
                if w != width {
                    return Err(Error::WidthMismatch {
                        name: name.to_string(),
                        loc: loc.to_string(),
                        source: hwsim_types::WidthError::mismatch(width, w),
                    });
                }
                let _ = label;
            }
        }

        let sources = vec![Some(initial_value), next, reset, clock_enable, reset_value];
        Ok(self.alloc(width, name, loc, sources, NodeKind::Register(RegisterNode { domain })))
    }

    /// Bind a register's next-value source. Fails if one is already bound.
    pub fn set_next(&mut self, reg: NodeId, next: NodeId) -> Result<()> {
        let width = self.node(reg).width();
        let next_width = self.node(next).width();
        if next_width != width {
            return Err(Error::WidthMismatch {
                name: self.node(reg).name().to_string(),
                loc: self.node(reg).loc().to_string(),
                source: hwsim_types::WidthError::mismatch(width, next_width),
            });
        }
        if self.node(reg).source_slot(RegisterNode::SLOT_NEXT).is_some() {
            return Err(Error::NextAlreadyBound {
                node: reg,
                name: self.node(reg).name().to_string(),
            });
        }
        let set = self.node_mut(reg).set_source_slot(RegisterNode::SLOT_NEXT, next);
        debug_assert!(set, "register always reserves a next slot");
        Ok(())
    }

    /// Create a memory.
    #[allow(clippy::too_many_arguments)]
    pub fn create_memory(
        &mut self,
        addr_width: u32,
        data_width: u32,
        depth: u32,
        num_banks: u32,
        byte_enable: bool,
        is_rom: bool,
        init: MemoryInit,
        name: &str,
        loc: &str,
    ) -> Result<NodeId> {
        let memory = Memory::new(name, addr_width, data_width, depth, num_banks, byte_enable, is_rom, init)?;
        Ok(self.alloc(data_width, name, loc, Vec::new(), NodeKind::Memory(memory)))
    }

    /// Create a read port on `mem`, returning `(port_id, data_output_id)`. The returned data
    /// output node is what downstream combinational logic should reference.
    pub fn create_mem_read_port(
        &mut self,
        mem: NodeId,
        kind: MemPortKind,
        clock: Option<NodeId>,
        addr: NodeId,
        enable: Option<NodeId>,
        name: &str,
        loc: &str,
    ) -> Result<(NodeId, NodeId)> {
        if kind == MemPortKind::Sync && clock.is_none() {
            return Err(Error::InvalidEdge {
                reason: "sync read port requires a clock edge".to_string(),
                name: name.to_string(),
                loc: loc.to_string(),
            });
        }
        if kind == MemPortKind::Async && clock.is_some() {
            return Err(Error::InvalidEdge {
                reason: "async read port must not bind a clock edge".to_string(),
                name: name.to_string(),
                loc: loc.to_string(),
            });
        }
        let data_width = self.memory(mem, name, loc)?.data_width();
        let port_id = self.memory_mut(mem)?.allocate_port_id();

        let sources = vec![clock, Some(addr), enable];
        let port_placeholder_output = NodeId::from_index(0);
        let port = self.alloc(
            data_width,
            name,
            loc,
            sources,
            NodeKind::MemReadPort(MemReadPortNode {
                parent: mem,
                port_id,
                port_kind: kind,
                data_output: port_placeholder_output,
            }),
        );

        let output_name = format!("{name}.data");
        let data_output = self.alloc(data_width, &output_name, loc, vec![Some(port)], NodeKind::Proxy);

        if let NodeKind::MemReadPort(p) = self.node_mut(port).kind_mut() {
            p.data_output = data_output;
        }
        self.memory_mut(mem)?.add_read_port(port);

        Ok((port, data_output))
    }

    /// Create a write port on `mem`. Fails if `mem` is a ROM.
    pub fn create_mem_write_port(
        &mut self,
        mem: NodeId,
        clock: NodeId,
        addr: NodeId,
        wdata: NodeId,
        enable: Option<NodeId>,
        name: &str,
        loc: &str,
    ) -> Result<NodeId> {
        let memory = self.memory(mem, name, loc)?;
        if memory.is_rom() {
            return Err(Error::InvalidEdge {
                reason: "cannot attach a write port to a ROM".to_string(),
                name: name.to_string(),
                loc: loc.to_string(),
            });
        }
        let data_width = memory.data_width();
        let wdata_width = self.node(wdata).width();
        if wdata_width != data_width {
            return Err(Error::WidthMismatch {
                name: name.to_string(),
                loc: loc.to_string(),
                source: hwsim_types::WidthError::mismatch(data_width, wdata_width),
            });
        }

        let port_id = self.memory_mut(mem)?.allocate_port_id();
        let sources = vec![Some(clock), Some(addr), Some(wdata), enable];
        let port = self.alloc(
            data_width,
            name,
            loc,
            sources,
            NodeKind::MemWritePort(MemWritePortNode { parent: mem, port_id }),
        );
        self.memory_mut(mem)?.add_write_port(port);
        Ok(port)
    }

    /// Unregister a port from its parent memory by port id. The port's node itself is left in
    /// place (`SPEC_FULL.md` §3.4); it simply stops being scheduled.
    pub fn remove_port(&mut self, mem: NodeId, port_id: u32) -> Result<()> {
        let found = self.nodes.iter().find_map(|n| match n.kind() {
            NodeKind::MemReadPort(p) if p.parent == mem && p.port_id == port_id => Some((n.id(), true)),
            NodeKind::MemWritePort(p) if p.parent == mem && p.port_id == port_id => Some((n.id(), false)),
            _ => None,
        });
        match found {
            Some((port_node, is_read)) => {
                let memory = self.memory_mut(mem)?;
                if is_read {
                    memory.remove_read_port(port_node);
                } else {
                    memory.remove_write_port(port_node);
                }
                Ok(())
            }
            None => Err(Error::NoSuchEdge {
                what: "port",
                index: port_id as usize,
                name: self.node(mem).name().to_string(),
                node: mem,
            }),
        }
    }

    /// Replace fan-in slot `index` of `node` with `new_node`.
    pub fn set_src(&mut self, node: NodeId, index: usize, new_node: NodeId) -> Result<()> {
        if self.node_mut(node).set_source_slot(index, new_node) {
            Ok(())
        } else {
            Err(Error::NoSuchEdge {
                what: "source edge",
                index,
                name: self.node(node).name().to_string(),
                node,
            })
        }
    }

    /// Push `clock` as the ambient clock for subsequent `create_reg`/`create_mem_read_port`/
    /// `create_mem_write_port` calls on this thread.
    pub fn push_clock(&self, clock: NodeId) {
        scope::push_clock(clock);
    }

    /// Pop the most recently pushed ambient clock.
    pub fn pop_clock(&self) -> Option<NodeId> {
        scope::pop_clock()
    }

    /// The current ambient clock, if any.
    pub fn current_clock(&self) -> Option<NodeId> {
        scope::current_clock()
    }

    /// Push `clock`, returning a guard that pops it on drop.
    pub fn scoped_clock(&self, clock: NodeId) -> ClockScope {
        ClockScope::enter(clock)
    }

    /// Push `reset` as the ambient reset for this thread.
    pub fn push_reset(&self, reset: NodeId) {
        scope::push_reset(reset);
    }

    /// Pop the most recently pushed ambient reset.
    pub fn pop_reset(&self) -> Option<NodeId> {
        scope::pop_reset()
    }

    /// The current ambient reset, if any.
    pub fn current_reset(&self) -> Option<NodeId> {
        scope::current_reset()
    }

    /// Push `reset`, returning a guard that pops it on drop.
    pub fn scoped_reset(&self, reset: NodeId) -> ResetScope {
        ResetScope::enter(reset)
    }

    /// Compile this context into a flat, immutable instruction schedule.
    pub fn finalize(self) -> Result<CompiledSchedule> {
        schedule::compile(self)
    }

    fn memory(&self, mem: NodeId, name: &str, loc: &str) -> Result<&Memory> {
        match self.node(mem).kind() {
            NodeKind::Memory(m) => Ok(m),
            _ => Err(Error::InvalidEdge {
                reason: "expected a memory node".to_string(),
                name: name.to_string(),
                loc: loc.to_string(),
            }),
        }
    }

    fn memory_mut(&mut self, mem: NodeId) -> Result<&mut Memory> {
        let name = self.node(mem).name().to_string();
        let loc = self.node(mem).loc().to_string();
        match self.node_mut(mem).kind_mut() {
            NodeKind::Memory(m) => Ok(m),
            _ => Err(Error::InvalidEdge {
                reason: "expected a memory node".to_string(),
                name,
                loc,
            }),
        }
    }

    fn require_equal_width(&self, a: NodeId, b: NodeId, name: &str, loc: &str) -> Result<()> {
        let (wa, wb) = (self.node(a).width(), self.node(b).width());
        if wa != wb {
            return Err(Error::WidthMismatch {
                name: name.to_string(),
                loc: loc.to_string(),
                source: hwsim_types::WidthError::mismatch(wa, wb),
            });
        }
        Ok(())
    }
}

fn requires_equal_operand_width(opcode: Opcode) -> bool {
    use Opcode::*;
    matches!(opcode, And | Or | Xor | Eq | Ne | Lt | Le | Gt | Ge)
}
