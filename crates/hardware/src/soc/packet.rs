//! Memory transactions.
//!
//! A `Transaction` is one read, write, or write-back travelling through the memory
//! system, first as a request and later, after `make_response`, as the matching
//! response. Transactions are moved between components by value: whichever
//! component holds one is its sole owner, and a rejected hand-off returns it to
//! the sender rather than dropping it.

use std::fmt;

use crate::common::addr::{block_align, block_offset, spans_blocks};

/// Caller-chosen tag used to match responses with requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a transaction asks the memory system to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Load `size` bytes.
    Read,
    /// Store the payload.
    Write,
    /// Evicted block being returned to memory; never answered.
    WritebackDirty,
}

impl Command {
    /// Returns `true` for commands that store data.
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write | Self::WritebackDirty)
    }

    /// Returns `true` for commands that load data.
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read)
    }
}

/// An in-flight memory access.
#[derive(Debug, PartialEq, Eq)]
pub struct Transaction {
    id: TransactionId,
    addr: u64,
    cmd: Command,
    data: Vec<u8>,
    response: bool,
    inst_fetch: bool,
}

impl Transaction {
    /// Creates a read request; the payload buffer is zeroed until the read completes.
    ///
    /// # Arguments
    ///
    /// * `id` - Tag for matching the response.
    /// * `addr` - First byte to read.
    /// * `size` - Number of bytes.
    pub fn read(id: TransactionId, addr: u64, size: usize) -> Self {
        Self {
            id,
            addr,
            cmd: Command::Read,
            data: vec![0; size],
            response: false,
            inst_fetch: false,
        }
    }

    /// Creates a write request carrying `data`; the size is the payload length.
    pub const fn write(id: TransactionId, addr: u64, data: Vec<u8>) -> Self {
        Self {
            id,
            addr,
            cmd: Command::Write,
            data,
            response: false,
            inst_fetch: false,
        }
    }

    /// Creates a write-back of an evicted block.
    pub const fn writeback(id: TransactionId, addr: u64, data: Vec<u8>) -> Self {
        Self {
            id,
            addr,
            cmd: Command::WritebackDirty,
            data,
            response: false,
            inst_fetch: false,
        }
    }

    /// Creates the block-sized read that an upgraded sub-block access fetches.
    ///
    /// The fetch starts at the base of the block containing `original`, covers
    /// exactly one block, and inherits the instruction-fetch flag.
    pub fn block_fetch(original: &Self, block_size: usize, id: TransactionId) -> Self {
        let mut fetch = Self::read(id, original.block_addr(block_size), block_size);
        fetch.inst_fetch = original.inst_fetch;
        fetch
    }

    /// Marks the transaction as an instruction fetch.
    #[must_use]
    pub const fn with_inst_fetch(mut self) -> Self {
        self.inst_fetch = true;
        self
    }

    /// Tag supplied by the creator.
    pub const fn id(&self) -> TransactionId {
        self.id
    }

    /// First byte addressed.
    pub const fn addr(&self) -> u64 {
        self.addr
    }

    /// Number of bytes addressed.
    pub const fn size(&self) -> usize {
        self.data.len()
    }

    /// Requested operation.
    pub const fn cmd(&self) -> Command {
        self.cmd
    }

    /// `true` for reads.
    pub const fn is_read(&self) -> bool {
        self.cmd.is_read()
    }

    /// `true` for writes and write-backs.
    pub const fn is_write(&self) -> bool {
        self.cmd.is_write()
    }

    /// `true` once the transaction has been turned into a response.
    pub const fn is_response(&self) -> bool {
        self.response
    }

    /// `true` for instruction fetches.
    pub const fn is_inst_fetch(&self) -> bool {
        self.inst_fetch
    }

    /// Write-backs are fire-and-forget; everything else is answered.
    pub const fn needs_response(&self) -> bool {
        !matches!(self.cmd, Command::WritebackDirty)
    }

    /// Payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable payload bytes, for responders filling in a read.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the transaction and returns its payload buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Base address of the block containing the first byte.
    pub const fn block_addr(&self, block_size: usize) -> u64 {
        block_align(self.addr, block_size)
    }

    /// Offset of the first byte inside its block.
    pub const fn offset_in_block(&self, block_size: usize) -> usize {
        block_offset(self.addr, block_size)
    }

    /// `true` if the access is exactly one aligned block.
    pub fn is_whole_block(&self, block_size: usize) -> bool {
        self.addr == self.block_addr(block_size) && self.size() == block_size
    }

    /// `true` if the access crosses a block boundary.
    pub fn spans_blocks(&self, block_size: usize) -> bool {
        spans_blocks(self.addr, self.size(), block_size)
    }

    /// Turns the request into its response.
    ///
    /// # Panics
    ///
    /// Panics if the transaction is already a response or never needs one.
    pub fn make_response(&mut self) {
        assert!(!self.response, "transaction {} is already a response", self.id);
        assert!(
            self.needs_response(),
            "transaction {} ({:?}) does not take a response",
            self.id,
            self.cmd
        );
        self.response = true;
    }

    /// Copies the payload into its slot of `block`.
    ///
    /// # Panics
    ///
    /// Panics if the access does not fit inside `block`.
    pub fn write_data_to_block(&self, block: &mut [u8]) {
        let offset = self.offset_in_block(block.len());
        let end = offset + self.size();
        assert!(end <= block.len(), "access at {:#x} overruns its block", self.addr);
        block[offset..end].copy_from_slice(&self.data);
    }

    /// Fills the payload from its slot of `block`.
    ///
    /// # Panics
    ///
    /// Panics if the access does not fit inside `block`.
    pub fn set_data_from_block(&mut self, block: &[u8]) {
        let offset = self.offset_in_block(block.len());
        let end = offset + self.size();
        assert!(end <= block.len(), "access at {:#x} overruns its block", self.addr);
        self.data.copy_from_slice(&block[offset..end]);
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}{} {} [{:#x}:{:#x}]",
            self.cmd,
            if self.response { "Resp" } else { "Req" },
            self.id,
            self.addr,
            self.addr + self.size() as u64,
        )
    }
}
