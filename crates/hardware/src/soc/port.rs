//! Blocking channel endpoints.
//!
//! A component talks to its neighbours through ports. Each port owns its peer and at
//! most one *blocked* outbound transaction: a transaction the peer refused, which is
//! re-sent verbatim when the peer signals readiness. Sending while a transaction is
//! blocked is a protocol violation and panics.
//!
//! * `CpuSidePort` faces upstream. It receives requests, returns responses, and
//!   remembers when it turned a request away so it can offer a retry later.
//! * `MemSidePort` faces downstream. It issues requests and receives responses;
//!   retries flow towards it, so it keeps no retry flag.

use std::fmt;

use tracing::{debug, trace};

use crate::common::AddrRange;
use crate::soc::packet::Transaction;
use crate::soc::traits::{Requestor, Responder};

/// Index of a cpu-side port within its owner.
pub type PortId = usize;

/// Capability shared by both port kinds: one-deep blocking output.
pub trait Port {
    /// Port name, used in logs and panic messages.
    fn name(&self) -> &str;

    /// Hands `tx` to the peer, parking it if the peer is busy.
    ///
    /// # Panics
    ///
    /// Panics if a transaction is already parked.
    fn send_packet(&mut self, tx: Transaction);

    /// The peer can take output again; re-sends the parked transaction.
    ///
    /// # Panics
    ///
    /// Panics if nothing is parked.
    fn recv_retry(&mut self);

    /// The transaction waiting for the peer, if any.
    fn blocked_packet(&self) -> Option<&Transaction>;

    /// Returns `true` while a transaction is parked.
    fn is_blocked(&self) -> bool {
        self.blocked_packet().is_some()
    }
}

/// Upstream-facing endpoint: accepts requests, delivers responses.
pub struct CpuSidePort {
    name: String,
    id: PortId,
    need_retry: bool,
    blocked_packet: Option<Transaction>,
    peer: Box<dyn Requestor>,
}

impl CpuSidePort {
    /// Creates a port bound to `peer`.
    ///
    /// # Arguments
    ///
    /// * `name` - Name used in logs.
    /// * `id` - Index of the port in its owner's port list.
    /// * `peer` - The requestor on the other side.
    pub fn new(name: impl Into<String>, id: PortId, peer: Box<dyn Requestor>) -> Self {
        Self {
            name: name.into(),
            id,
            need_retry: false,
            blocked_packet: None,
            peer,
        }
    }

    /// Index of this port in its owner.
    pub const fn id(&self) -> PortId {
        self.id
    }

    /// Returns `true` if a rejected requestor is still owed a retry.
    pub const fn needs_retry(&self) -> bool {
        self.need_retry
    }

    /// Checks whether a new request may be passed to the owner.
    ///
    /// A port that is still holding an undelivered response, or that already owes a
    /// retry, turns the request away and (re)arms the retry.
    pub fn accept_request(&mut self) -> bool {
        if self.blocked_packet.is_some() || self.need_retry {
            trace!(port = %self.name, "request refused, port busy");
            self.need_retry = true;
            return false;
        }
        true
    }

    /// Records that the owner refused a request arriving on this port.
    pub fn owe_retry(&mut self) {
        trace!(port = %self.name, "request refused by owner");
        self.need_retry = true;
    }

    /// Offers the owed retry, once, if nothing is waiting to be delivered.
    pub fn try_send_retry(&mut self) {
        if self.need_retry && self.blocked_packet.is_none() {
            self.need_retry = false;
            debug!(port = %self.name, "sending retry");
            self.peer.recv_req_retry();
        }
    }

    /// The requestor is ready for responses again.
    ///
    /// Re-delivers the blocked response first, then offers any owed retry so the
    /// requestor does not resubmit into a port still stuck on its own response.
    ///
    /// # Panics
    ///
    /// Panics if no response is blocked.
    pub fn recv_resp_retry(&mut self) {
        debug!(port = %self.name, "recv_resp_retry");
        let Some(tx) = self.blocked_packet.take() else {
            panic!("{}: response retry with no blocked response", self.name);
        };
        trace!(port = %self.name, %tx, "retrying response");
        self.send_packet(tx);
        self.try_send_retry();
    }

    /// Tells the requestor that the ranges behind this port changed.
    pub fn send_range_change(&mut self) {
        debug!(port = %self.name, "sending range change");
        self.peer.recv_range_change();
    }
}

impl Port for CpuSidePort {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_packet(&mut self, tx: Transaction) {
        assert!(
            self.blocked_packet.is_none(),
            "{}: should never try to send if blocked",
            self.name
        );
        if let Err(tx) = self.peer.recv_timing_resp(tx) {
            trace!(port = %self.name, %tx, "response refused, blocking");
            self.blocked_packet = Some(tx);
        }
    }

    fn recv_retry(&mut self) {
        self.recv_resp_retry();
    }

    fn blocked_packet(&self) -> Option<&Transaction> {
        self.blocked_packet.as_ref()
    }
}

impl fmt::Debug for CpuSidePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpuSidePort")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("need_retry", &self.need_retry)
            .field("blocked_packet", &self.blocked_packet)
            .finish_non_exhaustive()
    }
}

/// Downstream-facing endpoint: issues requests, receives responses.
pub struct MemSidePort {
    name: String,
    blocked_packet: Option<Transaction>,
    peer: Box<dyn Responder>,
}

impl MemSidePort {
    /// Creates a port bound to the responder `peer`.
    pub fn new(name: impl Into<String>, peer: Box<dyn Responder>) -> Self {
        Self {
            name: name.into(),
            blocked_packet: None,
            peer,
        }
    }

    /// The responder can take requests again; re-sends the blocked request verbatim.
    ///
    /// # Panics
    ///
    /// Panics if no request is blocked.
    pub fn recv_req_retry(&mut self) {
        debug!(port = %self.name, "recv_req_retry");
        let Some(tx) = self.blocked_packet.take() else {
            panic!("{}: request retry with no blocked request", self.name);
        };
        self.send_packet(tx);
    }

    /// Performs an untimed access through the responder.
    pub fn send_functional(&mut self, tx: &mut Transaction) {
        trace!(port = %self.name, %tx, "forwarding functional access");
        self.peer.recv_functional(tx);
    }

    /// Address ranges served behind this port.
    pub fn address_ranges(&self) -> Vec<AddrRange> {
        self.peer.address_ranges()
    }
}

impl Port for MemSidePort {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_packet(&mut self, tx: Transaction) {
        assert!(
            self.blocked_packet.is_none(),
            "{}: should never try to send if blocked",
            self.name
        );
        if let Err(tx) = self.peer.recv_timing_req(tx) {
            trace!(port = %self.name, %tx, "request refused, blocking");
            self.blocked_packet = Some(tx);
        }
    }

    fn recv_retry(&mut self) {
        self.recv_req_retry();
    }

    fn blocked_packet(&self) -> Option<&Transaction> {
        self.blocked_packet.as_ref()
    }
}

impl fmt::Debug for MemSidePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemSidePort")
            .field("name", &self.name)
            .field("blocked_packet", &self.blocked_packet)
            .finish_non_exhaustive()
    }
}
