//! Timing-accurate blocking cache model.
//!
//! This crate models a small memory system driven by a discrete-event scheduler:
//! 1. **Cache:** A blocking, single-block-granularity cache with random eviction,
//!    dirty write-back, and sub-block request upgrading.
//! 2. **Ports:** One-deep blocking channels with a retry protocol that never drops
//!    or duplicates a transaction.
//! 3. **Multiplexer:** A pass-through that merges instruction and data streams onto
//!    one memory channel.
//! 4. **Configuration:** Cache geometry and latency, with defaults and validation.
//!
//! Time is external: components hand deferred work to a [`sim::Scheduler`] and are
//! driven by whoever owns the event queue.

/// Common types (address ranges, alignment, errors).
pub mod common;
/// Cache configuration (defaults, deserialization, validation).
pub mod config;
/// Simulated time and the scheduler interface.
pub mod sim;
/// Memory-system components (transactions, ports, cache, multiplexer).
pub mod soc;

/// Cache configuration; use `CacheConfig::default()` or `CacheConfig::from_json`.
pub use crate::config::CacheConfig;
/// The blocking cache; construct with `SimpleCache::new`.
pub use crate::soc::SimpleCache;
/// An in-flight memory access.
pub use crate::soc::Transaction;
