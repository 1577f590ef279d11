//! Common utilities and types used throughout the memory system model.
//!
//! This module provides the building blocks shared by the cache, the ports, and the
//! pass-through memory. It includes:
//! 1. **Address Types:** Address ranges and block alignment helpers.
//! 2. **Error Handling:** Construction errors for invalid configurations.

/// Address range type and block alignment helpers.
pub mod addr;

/// Error types.
pub mod error;

pub use addr::{AddrRange, block_align, block_offset, spans_blocks};
pub use error::ConfigError;
