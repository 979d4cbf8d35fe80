//! Memory nodes and their ports (`SPEC_FULL.md` §3.3, §4.4, §6.3).

use hwsim_types::{NodeId, Sdata};

use crate::error::{Error, Result};

/// Initial contents of a memory: index *i* is the word at address *i*; missing trailing entries
/// default to zero (`SPEC_FULL.md` §6.3).
pub type MemoryInit = Vec<Sdata>;

/// Read/write discipline of a memory port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum MemPortKind {
    /// Combinationally reflects the word at the current address within the same cycle.
    #[strum(serialize = "async")]
    Async,
    /// Samples address/data at the bound clock's active edge; holds between edges.
    #[strum(serialize = "sync")]
    Sync,
}

/// A `depth`-entry table of `data_width`-bit words.
#[derive(Debug, Clone)]
pub struct Memory {
    addr_width: u32,
    data_width: u32,
    depth: u32,
    num_banks: u32,
    byte_enable: bool,
    is_rom: bool,
    init: Vec<Sdata>,
    read_ports: Vec<NodeId>,
    write_ports: Vec<NodeId>,
    next_port_id: u32,
}

impl Memory {
    /// Build a memory's state, validating and normalizing `init` per `SPEC_FULL.md` §6.3 /
    /// §9 (entries narrower than `data_width` are zero-extended; missing trailing entries
    /// default to zero; entries wider than `data_width` are a construction error).
    pub fn new(
        name: &str,
        addr_width: u32,
        data_width: u32,
        depth: u32,
        num_banks: u32,
        byte_enable: bool,
        is_rom: bool,
        init: MemoryInit,
    ) -> Result<Self> {
        let mut normalized = Vec::with_capacity(depth as usize);
        for (index, entry) in init.into_iter().enumerate() {
            if entry.width() > data_width {
                return Err(Error::InitOverflow {
                    index,
                    name: name.to_string(),
                    data_width,
                });
            }
            normalized.push(entry.zext(data_width).expect("validated above"));
        }
        normalized.resize(depth as usize, Sdata::zero(data_width));

        Ok(Self {
            addr_width,
            data_width,
            depth,
            num_banks,
            byte_enable,
            is_rom,
            init: normalized,
            read_ports: Vec::new(),
            write_ports: Vec::new(),
            next_port_id: 0,
        })
    }

    /// Address bus width.
    pub const fn addr_width(&self) -> u32 {
        self.addr_width
    }

    /// Word width.
    pub const fn data_width(&self) -> u32 {
        self.data_width
    }

    /// Number of addressable words.
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of banks this memory is organized into.
    pub const fn num_banks(&self) -> u32 {
        self.num_banks
    }

    /// Whether per-byte write enables are in effect.
    pub const fn has_byte_enable(&self) -> bool {
        self.byte_enable
    }

    /// Width of the independently-writable lane: 8 bits when byte enable is active, else the
    /// full word.
    pub const fn lane_width(&self) -> u32 {
        if self.byte_enable {
            8
        } else {
            self.data_width
        }
    }

    /// Whether this memory rejects write ports.
    pub const fn is_rom(&self) -> bool {
        self.is_rom
    }

    /// The normalized initial contents, one entry per address.
    pub fn init(&self) -> &[Sdata] {
        &self.init
    }

    /// Read ports registered on this memory, in registration order.
    pub fn read_ports(&self) -> &[NodeId] {
        &self.read_ports
    }

    /// Write ports registered on this memory, in registration order.
    pub fn write_ports(&self) -> &[NodeId] {
        &self.write_ports
    }

    pub(crate) fn allocate_port_id(&mut self) -> u32 {
        let id = self.next_port_id;
        self.next_port_id += 1;
        id
    }

    pub(crate) fn add_read_port(&mut self, port: NodeId) {
        self.read_ports.push(port);
    }

    pub(crate) fn add_write_port(&mut self, port: NodeId) {
        self.write_ports.push(port);
    }

    pub(crate) fn remove_read_port(&mut self, port: NodeId) {
        self.read_ports.retain(|p| *p != port);
    }

    pub(crate) fn remove_write_port(&mut self, port: NodeId) {
        self.write_ports.retain(|p| *p != port);
    }
}
