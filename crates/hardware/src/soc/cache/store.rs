//! Block storage.
//!
//! `BlockStore` maps block-aligned addresses to owned block buffers and never holds
//! more than `capacity` of them. Resident addresses are also kept in a dense vector
//! so that a uniformly random victim can be drawn in constant time; each entry
//! remembers its slot in that vector so removal stays constant time as well.

use std::collections::HashMap;

use tracing::trace;

use super::victim::RandomVictim;
use crate::common::addr::block_align;

/// One cached block: its aligned address and exactly `block_size` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    addr: u64,
    data: Box<[u8]>,
}

impl Block {
    /// Block-aligned base address.
    pub const fn addr(&self) -> u64 {
        self.addr
    }

    /// Block contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable block contents.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the block and returns its buffer.
    pub fn into_data(self) -> Box<[u8]> {
        self.data
    }
}

#[derive(Debug)]
struct Entry {
    block: Block,
    slot: usize,
}

/// Capacity-bounded map from aligned address to block.
#[derive(Debug)]
pub struct BlockStore {
    block_size: usize,
    capacity: usize,
    blocks: HashMap<u64, Entry>,
    resident: Vec<u64>,
    victim: RandomVictim,
}

impl BlockStore {
    /// Creates an empty store.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Bytes per block; a power of two.
    /// * `capacity` - Maximum number of resident blocks.
    /// * `seed` - Seed for victim selection.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is not a power of two or `capacity` is zero.
    pub fn new(block_size: usize, capacity: usize, seed: u64) -> Self {
        assert!(block_size.is_power_of_two(), "block size {block_size} is not a power of two");
        assert!(capacity > 0, "block store needs room for at least one block");
        Self {
            block_size,
            capacity,
            blocks: HashMap::with_capacity(capacity),
            resident: Vec::with_capacity(capacity),
            victim: RandomVictim::new(seed),
        }
    }

    /// Bytes per block.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Maximum number of resident blocks.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident blocks.
    pub const fn len(&self) -> usize {
        self.resident.len()
    }

    /// Returns `true` if no block is resident.
    pub const fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Returns `true` if inserting would first require an eviction.
    pub const fn is_full(&self) -> bool {
        self.resident.len() >= self.capacity
    }

    /// Returns `true` if the block containing `addr` is resident.
    pub fn contains(&self, addr: u64) -> bool {
        self.blocks.contains_key(&block_align(addr, self.block_size))
    }

    /// Looks up the block containing `addr`.
    pub fn lookup(&self, addr: u64) -> Option<&Block> {
        self.blocks
            .get(&block_align(addr, self.block_size))
            .map(|entry| &entry.block)
    }

    /// Looks up the block containing `addr` for modification.
    pub fn lookup_mut(&mut self, addr: u64) -> Option<&mut Block> {
        self.blocks
            .get_mut(&block_align(addr, self.block_size))
            .map(|entry| &mut entry.block)
    }

    /// Resident block addresses in ascending order.
    pub fn resident_addrs(&self) -> Vec<u64> {
        let mut addrs = self.resident.clone();
        addrs.sort_unstable();
        addrs
    }

    /// Stores a new block, taking ownership of `data`.
    ///
    /// The caller makes room first (see [`BlockStore::evict_random`]).
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not block-aligned, is already resident, if `data` is not
    /// exactly one block long, or if the store is full.
    pub fn insert(&mut self, addr: u64, data: Box<[u8]>) {
        assert_eq!(addr, block_align(addr, self.block_size), "block address {addr:#x} is not aligned");
        assert_eq!(
            data.len(),
            self.block_size,
            "block at {addr:#x} has {} bytes, expected {}",
            data.len(),
            self.block_size
        );
        assert!(!self.blocks.contains_key(&addr), "block {addr:#x} is already resident");
        assert!(!self.is_full(), "inserting {addr:#x} into a full block store");

        trace!(addr = format_args!("{addr:#x}"), "storing block");
        let slot = self.resident.len();
        self.resident.push(addr);
        let previous = self.blocks.insert(
            addr,
            Entry {
                block: Block { addr, data },
                slot,
            },
        );
        debug_assert!(previous.is_none());
    }

    /// Removes and returns the block at the aligned address `addr`.
    pub fn remove(&mut self, addr: u64) -> Option<Block> {
        let entry = self.blocks.remove(&addr)?;
        let moved = self.resident.swap_remove(entry.slot);
        debug_assert_eq!(moved, addr);
        if let Some(&relocated) = self.resident.get(entry.slot)
            && let Some(other) = self.blocks.get_mut(&relocated)
        {
            other.slot = entry.slot;
        }
        Some(entry.block)
    }

    /// Removes a resident block chosen uniformly at random.
    ///
    /// Returns `None` if the store is empty.
    pub fn evict_random(&mut self) -> Option<Block> {
        if self.resident.is_empty() {
            return None;
        }
        let addr = self.resident[self.victim.pick(self.resident.len())];
        trace!(addr = format_args!("{addr:#x}"), "evicting block");
        self.remove(addr)
    }
}
