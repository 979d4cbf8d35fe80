//! Topological compilation of a [`Context`] into a flat, immutable instruction schedule
//! (`SPEC_FULL.md` §4.6).
//!
//! Registers and synchronous memory read ports are cut points: their cycle-*N* output depends
//! only on state committed at the end of cycle *N-1*, so they are excluded from the
//! combinational topological sort entirely and handled by the simulator's own publish/commit
//! phases instead of by an ordered instruction.

use std::collections::{HashMap, HashSet, VecDeque};

use hwsim_types::{ClockDomainId, NodeId};

use crate::{
    context::Context,
    error::{Error, Result},
    node::{clock::ClockPolarity, memory::MemPortKind, Node, NodeKind, RegisterNode},
};

/// The compiled, immutable form of a finalized context.
#[derive(Debug)]
pub struct CompiledSchedule {
    nodes: Vec<Node>,
    combinational: Vec<NodeId>,
    registers: Vec<NodeId>,
    sync_read_ports: Vec<NodeId>,
    domain_clocks: HashMap<ClockDomainId, (NodeId, ClockPolarity)>,
}

impl CompiledSchedule {
    /// Every node, indexed by `NodeId::index()`.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// A single node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Combinational instructions in dependency order (inputs-with-drivers, outputs, ops, muxes,
    /// proxies, async memory reads).
    pub fn combinational(&self) -> &[NodeId] {
        &self.combinational
    }

    /// Every register, in construction order.
    pub fn registers(&self) -> &[NodeId] {
        &self.registers
    }

    /// Every synchronous memory read port, in construction order.
    pub fn sync_read_ports(&self) -> &[NodeId] {
        &self.sync_read_ports
    }

    /// The clock node and polarity backing a given clock domain, if any register or port was
    /// ever built under it.
    pub fn domain_clock(&self, domain: ClockDomainId) -> Option<(NodeId, ClockPolarity)> {
        self.domain_clocks.get(&domain).copied()
    }
}

/// Compile `ctx` into a [`CompiledSchedule`]. See [`crate::context::Context::finalize`].
#[tracing::instrument(skip(ctx), fields(context = ctx.name()))]
pub(crate) fn compile(ctx: Context) -> Result<CompiledSchedule> {
    let nodes = ctx.into_nodes();

    let mut domain_clocks = HashMap::new();
    for node in &nodes {
        if let NodeKind::Clock(clock) = node.kind() {
            domain_clocks.insert(clock.domain, (node.id(), clock.polarity));
        }
    }

    let mut registers = Vec::new();
    let mut sync_read_ports = Vec::new();
    let mut is_combinational = vec![false; nodes.len()];

    for node in &nodes {
        match node.kind() {
            NodeKind::Register(_) => registers.push(node.id()),
            NodeKind::MemReadPort(p) if p.port_kind == MemPortKind::Sync => sync_read_ports.push(node.id()),
            NodeKind::MemReadPort(p) if p.port_kind == MemPortKind::Async => {
                is_combinational[node.id().index()] = true;
            }
            NodeKind::Input | NodeKind::Output => {
                is_combinational[node.id().index()] = node.source_slot(0).is_some();
            }
            NodeKind::Op(_) | NodeKind::Mux | NodeKind::Proxy => {
                is_combinational[node.id().index()] = true;
            }
            _ => {}
        }
    }

    for &reg in &registers {
        if nodes[reg.index()].source_slot(RegisterNode::SLOT_NEXT).is_none() {
            return Err(Error::UnboundNext {
                node: reg,
                name: nodes[reg.index()].name().to_string(),
            });
        }
    }

    let combinational = topological_order(&nodes, &is_combinational)?;

    tracing::debug!(
        instructions = combinational.len(),
        registers = registers.len(),
        sync_read_ports = sync_read_ports.len(),
        "context finalized"
    );

    Ok(CompiledSchedule {
        nodes,
        combinational,
        registers,
        sync_read_ports,
        domain_clocks,
    })
}

fn topological_order(nodes: &[Node], is_combinational: &[bool]) -> Result<Vec<NodeId>> {
    let candidates: Vec<NodeId> = nodes
        .iter()
        .filter(|n| is_combinational[n.id().index()])
        .map(Node::id)
        .collect();
    let candidate_set: HashSet<NodeId> = candidates.iter().copied().collect();

    let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
    let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for &id in &candidates {
        let deps: Vec<NodeId> = nodes[id.index()].dependencies().filter(|d| candidate_set.contains(d)).collect();
        in_degree.insert(id, deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(id);
        }
    }

    let mut ready: VecDeque<NodeId> = candidates.iter().copied().filter(|id| in_degree[id] == 0).collect();
    let mut order = Vec::with_capacity(candidates.len());
    while let Some(id) = ready.pop_front() {
        order.push(id);
        if let Some(deps) = dependents.get(&id) {
            for &dep in deps {
                let remaining = in_degree.get_mut(&dep).expect("dependent tracked in in_degree");
                *remaining -= 1;
                if *remaining == 0 {
                    ready.push_back(dep);
                }
            }
        }
    }

    if order.len() != candidates.len() {
        let stuck = candidates
            .into_iter()
            .find(|id| in_degree[id] > 0)
            .expect("order/candidate length mismatch implies an unresolved node");
        return Err(Error::CombinationalCycle {
            node: stuck,
            name: nodes[stuck.index()].name().to_string(),
        });
    }

    Ok(order)
}
