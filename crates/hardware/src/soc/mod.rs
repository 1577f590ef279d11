//! Memory-system components.
//!
//! This module organizes the components of the modelled memory system: the
//! transactions that flow through it, the ports that carry them, the blocking
//! cache, and the instruction/data multiplexer in front of memory.

/// Blocking single-block-granularity cache.
pub mod cache;

/// Instruction/data pass-through multiplexer.
pub mod memory;

/// Memory transactions.
pub mod packet;

/// Blocking channel endpoints.
pub mod port;

/// Peer traits for requestors and responders.
pub mod traits;

pub use cache::SimpleCache;
pub use memory::PassThroughMemory;
pub use packet::{Command, Transaction, TransactionId};
pub use port::{CpuSidePort, MemSidePort, Port, PortId};
pub use traits::{Requestor, Responder};
