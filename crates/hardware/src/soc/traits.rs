//! Peer traits for the two ends of a channel.
//!
//! This module defines what a component needs from the objects its ports are bound to. It provides:
//! 1. **Requestor:** The upstream peer (a CPU or a cache above) that receives responses.
//! 2. **Responder:** The downstream peer (a memory or a cache below) that receives requests.
//!
//! Every timed hand-off is by value and returns `Err(tx)` when the peer is momentarily
//! busy; the sender keeps the transaction and re-sends it once the peer signals that it
//! is ready again. Peers never call back into the sender from inside these methods.

use crate::common::AddrRange;
use crate::soc::packet::Transaction;

/// Upstream peer of a cpu-side port.
pub trait Requestor {
    /// Offers a completed response.
    ///
    /// # Errors
    ///
    /// Returns the response unchanged if the requestor cannot take it now; it must
    /// later call the port's `recv_resp_retry`.
    fn recv_timing_resp(&mut self, tx: Transaction) -> Result<(), Transaction>;

    /// Signals that a previously rejected request may now be re-sent.
    fn recv_req_retry(&mut self);

    /// Signals that the address ranges behind the port have changed.
    fn recv_range_change(&mut self) {}
}

/// Downstream peer of a memory-side port.
pub trait Responder {
    /// Offers a request.
    ///
    /// An accepted request that `needs_response` is answered exactly once through the
    /// sender's `recv_timing_resp`.
    ///
    /// # Errors
    ///
    /// Returns the request unchanged if the responder is busy; it must later call the
    /// sender's `recv_req_retry`.
    fn recv_timing_req(&mut self, tx: Transaction) -> Result<(), Transaction>;

    /// Performs an untimed access in place.
    fn recv_functional(&mut self, tx: &mut Transaction);

    /// Address ranges served by this responder.
    fn address_ranges(&self) -> Vec<AddrRange>;
}
