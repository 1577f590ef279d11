//! Two-to-one memory multiplexer.
//!
//! `PassThroughMemory` merges an instruction stream and a data stream onto a single
//! blocking memory-side channel. It adds no latency and stores nothing:
//! 1. **Request:** Accepted from either port while no other request is outstanding,
//!    then sent downstream unchanged.
//! 2. **Response:** Routed back to the instruction port for instruction fetches and
//!    to the data port for everything else.
//! 3. **Retry:** Once free, both ports are offered the retry they may be owed.
//!
//! It uses the same port types as `SimpleCache` and follows the same protocol.

use std::fmt;

use tracing::{debug, trace};

use crate::common::AddrRange;
use crate::soc::packet::Transaction;
use crate::soc::port::{CpuSidePort, MemSidePort, Port, PortId};
use crate::soc::traits::{Requestor, Responder};

/// Port index of the instruction-side requestor.
pub const INST_PORT: PortId = 0;

/// Port index of the data-side requestor.
pub const DATA_PORT: PortId = 1;

/// Blocking multiplexer with one outstanding request.
pub struct PassThroughMemory {
    name: String,
    cpu_ports: [CpuSidePort; 2],
    mem_port: MemSidePort,
    blocked: bool,
}

impl PassThroughMemory {
    /// Creates the multiplexer and binds its three ports.
    ///
    /// # Arguments
    ///
    /// * `name` - Instance name, used as a prefix for the port names.
    /// * `inst` - Requestor issuing instruction fetches.
    /// * `data` - Requestor issuing data accesses.
    /// * `memory` - The downstream responder.
    pub fn new(
        name: impl Into<String>,
        inst: Box<dyn Requestor>,
        data: Box<dyn Requestor>,
        memory: Box<dyn Responder>,
    ) -> Self {
        let name = name.into();
        Self {
            cpu_ports: [
                CpuSidePort::new(format!("{name}.inst_port"), INST_PORT, inst),
                CpuSidePort::new(format!("{name}.data_port"), DATA_PORT, data),
            ],
            mem_port: MemSidePort::new(format!("{name}.mem_port"), memory),
            blocked: false,
            name,
        }
    }

    /// Returns `true` while a request is outstanding.
    pub const fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Cpu-side port `id` ([`INST_PORT`] or [`DATA_PORT`]).
    pub const fn cpu_port(&self, id: PortId) -> &CpuSidePort {
        &self.cpu_ports[id]
    }

    /// The memory-side port.
    pub const fn mem_port(&self) -> &MemSidePort {
        &self.mem_port
    }

    /// Timed request arriving on `port`.
    ///
    /// # Errors
    ///
    /// Returns the transaction if the port is busy, a request is outstanding, or the
    /// memory-side port is still holding a refused request.
    ///
    /// # Panics
    ///
    /// Panics if `port` is neither [`INST_PORT`] nor [`DATA_PORT`].
    pub fn recv_timing_req(&mut self, port: PortId, tx: Transaction) -> Result<(), Transaction> {
        assert!(port < self.cpu_ports.len(), "{}: no cpu-side port {port}", self.name);
        debug!(memory = %self.name, port, %tx, "recv_timing_req");

        if !self.cpu_ports[port].accept_request() {
            return Err(tx);
        }
        if self.blocked || self.mem_port.is_blocked() {
            self.cpu_ports[port].owe_retry();
            return Err(tx);
        }

        // Write-backs are never answered, so they do not hold the multiplexer.
        self.blocked = tx.needs_response();
        self.mem_port.send_packet(tx);
        Ok(())
    }

    /// The requestor on `port` can take the response it refused earlier.
    pub fn recv_resp_retry(&mut self, port: PortId) {
        self.cpu_ports[port].recv_resp_retry();
    }

    /// Untimed access, passed straight to memory.
    pub fn recv_functional(&mut self, tx: &mut Transaction) {
        self.mem_port.send_functional(tx);
    }

    /// Address ranges of the memory behind the multiplexer.
    pub fn address_ranges(&self) -> Vec<AddrRange> {
        self.mem_port.address_ranges()
    }

    /// Response from memory for the outstanding request.
    ///
    /// # Panics
    ///
    /// Panics if no request is outstanding.
    pub fn recv_timing_resp(&mut self, tx: Transaction) {
        debug!(memory = %self.name, %tx, "recv_timing_resp");
        assert!(self.blocked, "{}: response {} while no request is outstanding", self.name, tx);
        self.blocked = false;

        let port = if tx.is_inst_fetch() { INST_PORT } else { DATA_PORT };
        trace!(memory = %self.name, port, "routing response");
        self.cpu_ports[port].send_packet(tx);

        self.offer_retries();
    }

    /// Memory can take the request it refused earlier.
    pub fn recv_req_retry(&mut self) {
        self.mem_port.recv_req_retry();
        if !self.blocked && !self.mem_port.is_blocked() {
            self.offer_retries();
        }
    }

    /// Memory's address ranges changed; tell both requestors.
    pub fn recv_range_change(&mut self) {
        for port in &mut self.cpu_ports {
            port.send_range_change();
        }
    }

    fn offer_retries(&mut self) {
        for port in &mut self.cpu_ports {
            port.try_send_retry();
        }
    }
}

impl fmt::Debug for PassThroughMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassThroughMemory")
            .field("name", &self.name)
            .field("cpu_ports", &self.cpu_ports)
            .field("mem_port", &self.mem_port)
            .field("blocked", &self.blocked)
            .finish()
    }
}
