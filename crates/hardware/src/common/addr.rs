//! Address ranges and block alignment arithmetic.
//!
//! This module defines the address helpers shared by the cache and its ports. It provides:
//! 1. **Ranges:** `AddrRange`, the half-open interval a responder answers for.
//! 2. **Alignment:** Block base address and in-block offset for a given block size.
//! 3. **Spanning:** Detection of accesses that cross a block boundary.
//!
//! Block sizes are always powers of two (enforced by `CacheConfig::validate`), so
//! alignment is a mask operation.

use std::fmt;

/// A half-open physical address interval `[start, end)`.
///
/// Responders report the ranges they serve; the cache forwards the ranges of the
/// memory behind it unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddrRange {
    start: u64,
    end: u64,
}

impl AddrRange {
    /// Creates a range covering `[start, end)`.
    ///
    /// # Arguments
    ///
    /// * `start` - First address in the range.
    /// * `end` - One past the last address in the range.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(end >= start, "address range end {end:#x} precedes start {start:#x}");
        Self { start, end }
    }

    /// Creates a range of `size` bytes beginning at `base`.
    pub fn with_size(base: u64, size: u64) -> Self {
        Self::new(base, base + size)
    }

    /// First address covered by the range.
    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// One past the last address covered by the range.
    #[inline]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered.
    #[inline]
    pub const fn size(&self) -> u64 {
        self.end - self.start
    }

    /// Returns `true` if `addr` lies inside the range.
    #[inline]
    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}:{:#x})", self.start, self.end)
    }
}

/// Returns the base address of the block containing `addr`.
///
/// # Arguments
///
/// * `addr` - Any byte address.
/// * `block_size` - Block size in bytes; must be a power of two.
///
/// # Returns
///
/// `addr` rounded down to a multiple of `block_size`.
#[inline(always)]
pub const fn block_align(addr: u64, block_size: usize) -> u64 {
    addr & !(block_size as u64 - 1)
}

/// Returns the byte offset of `addr` inside its block.
#[inline(always)]
pub const fn block_offset(addr: u64, block_size: usize) -> usize {
    (addr & (block_size as u64 - 1)) as usize
}

/// Returns `true` if an access of `size` bytes at `addr` touches more than one block.
///
/// # Arguments
///
/// * `addr` - First byte of the access.
/// * `size` - Access length in bytes.
/// * `block_size` - Block size in bytes; must be a power of two.
#[inline]
pub const fn spans_blocks(addr: u64, size: usize, block_size: usize) -> bool {
    block_offset(addr, block_size) + size > block_size
}
