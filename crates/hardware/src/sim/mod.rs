//! Simulation time and event scheduling.
//!
//! Components never advance time themselves. When an action must happen later they
//! hand an event to a `Scheduler`; whoever owns the event queue hands the event
//! back to the component (`SimpleCache::process`) once the delay has elapsed, on
//! the same thread of control.

use crate::soc::packet::Transaction;

/// Simulated time, in clock cycles.
pub type Cycles = u64;

/// Deferred work the cache asks to be run later.
#[derive(Debug)]
pub enum CacheEvent {
    /// Perform the timed lookup for an admitted transaction.
    ///
    /// The scheduler holds the transaction while the access latency elapses.
    AccessTiming(Transaction),
}

/// Delivers events after a delay.
///
/// Implementations must return every scheduled event exactly once, after at least
/// `delay` cycles, in delay order.
pub trait Scheduler {
    /// Queues `event` to fire `delay` cycles from now.
    fn schedule_after(&mut self, delay: Cycles, event: CacheEvent);
}
