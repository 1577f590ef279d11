//! Blocking, single-block-granularity cache.
//!
//! `SimpleCache` sits between any number of upstream requestors and one downstream
//! memory. It serves one transaction at a time:
//! 1. **Admission:** A request is accepted only while nothing else is in flight; the
//!    lookup is then scheduled `latency` cycles later.
//! 2. **Hit:** Data is copied between the request and the resident block and the
//!    response goes straight back up.
//! 3. **Miss:** Whole-block requests are forwarded as they are. Smaller or unaligned
//!    ones are upgraded to a block-sized read; the original waits in
//!    `pending_upgrade` until the block arrives.
//! 4. **Fill:** The returned block is stored (evicting and writing back a random
//!    victim when full) and the waiting request is answered from it.
//! 5. **Reply:** The response goes to the port it came from, then every port is
//!    offered the retry it may be owed.
//!
//! Requests that are turned away keep their transaction with the requestor, which
//! resubmits after `recv_req_retry`.

/// Block storage with random eviction.
pub mod store;

/// Seeded victim selection.
pub mod victim;

use std::fmt;

use tracing::{debug, trace};

use self::store::BlockStore;
use crate::common::{AddrRange, ConfigError};
use crate::config::CacheConfig;
use crate::sim::{CacheEvent, Cycles, Scheduler};
use crate::soc::packet::{Transaction, TransactionId};
use crate::soc::port::{CpuSidePort, MemSidePort, Port, PortId};
use crate::soc::traits::{Requestor, Responder};

/// Transactions the cache creates itself are tagged from the top half of the id space.
const INTERNAL_ID_BASE: u64 = 1 << 63;

/// Blocking cache with one outstanding access.
pub struct SimpleCache {
    name: String,
    latency: Cycles,
    block_size: usize,
    cpu_ports: Vec<CpuSidePort>,
    mem_port: MemSidePort,
    scheduler: Box<dyn Scheduler>,
    store: BlockStore,
    /// Set from admission until the response has been handed to its port.
    blocked: bool,
    /// Port that will receive the in-flight response; `Some` exactly while blocked.
    waiting_port: Option<PortId>,
    /// Sub-block request waiting for the block-sized fetch it triggered.
    pending_upgrade: Option<Transaction>,
    next_internal_id: u64,
}

impl SimpleCache {
    /// Builds a cache and binds its ports.
    ///
    /// # Arguments
    ///
    /// * `name` - Instance name; ports are named `<name>.cpu_side[i]` and `<name>.mem_side`.
    /// * `config` - Geometry, latency, port count, and eviction seed.
    /// * `requestors` - One upstream peer per configured cpu-side port.
    /// * `memory` - The downstream responder.
    /// * `scheduler` - Delivers the deferred accesses back through [`SimpleCache::process`].
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid or the number of
    /// requestors differs from `config.cpu_ports`.
    pub fn new(
        name: impl Into<String>,
        config: &CacheConfig,
        requestors: Vec<Box<dyn Requestor>>,
        memory: Box<dyn Responder>,
        scheduler: Box<dyn Scheduler>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if requestors.len() != config.cpu_ports {
            return Err(ConfigError::PortCountMismatch {
                expected: config.cpu_ports,
                actual: requestors.len(),
            });
        }

        let name = name.into();
        let cpu_ports = requestors
            .into_iter()
            .enumerate()
            .map(|(id, peer)| CpuSidePort::new(format!("{name}.cpu_side[{id}]"), id, peer))
            .collect();
        let mem_port = MemSidePort::new(format!("{name}.mem_side"), memory);
        debug!(
            cache = %name,
            capacity = config.capacity(),
            block_size = config.block_size,
            latency = config.latency,
            "cache created"
        );

        Ok(Self {
            latency: config.latency,
            block_size: config.block_size,
            cpu_ports,
            mem_port,
            scheduler,
            store: BlockStore::new(config.block_size, config.capacity(), config.seed),
            blocked: false,
            waiting_port: None,
            pending_upgrade: None,
            next_internal_id: INTERNAL_ID_BASE,
            name,
        })
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block size in bytes.
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Cycles between admission and lookup.
    pub const fn latency(&self) -> Cycles {
        self.latency
    }

    /// Returns `true` while a transaction is in flight.
    pub const fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Port the in-flight transaction came from.
    pub const fn waiting_port(&self) -> Option<PortId> {
        self.waiting_port
    }

    /// Returns `true` while an upgraded request waits for its block.
    pub const fn has_pending_upgrade(&self) -> bool {
        self.pending_upgrade.is_some()
    }

    /// Resident blocks.
    pub const fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Number of cpu-side ports.
    pub const fn num_cpu_ports(&self) -> usize {
        self.cpu_ports.len()
    }

    /// Cpu-side port `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn cpu_port(&self, id: PortId) -> &CpuSidePort {
        &self.cpu_ports[id]
    }

    /// The memory-side port.
    pub const fn mem_port(&self) -> &MemSidePort {
        &self.mem_port
    }

    // ──────────────────────────────────────────────────────────
    // Cpu side
    // ──────────────────────────────────────────────────────────

    /// Timed request arriving on cpu-side port `port`.
    ///
    /// # Errors
    ///
    /// Returns the transaction if the port or the cache is busy, or if a refused
    /// write-back is still waiting on the memory side. The port then owes the
    /// requestor a retry, which it delivers through `recv_req_retry` once all of
    /// them are free again.
    ///
    /// # Panics
    ///
    /// Panics if `port` is out of range.
    pub fn recv_timing_req(&mut self, port: PortId, tx: Transaction) -> Result<(), Transaction> {
        assert!(port < self.cpu_ports.len(), "{}: no cpu-side port {port}", self.name);
        debug!(cache = %self.name, port, %tx, "recv_timing_req");

        if !self.cpu_ports[port].accept_request() {
            return Err(tx);
        }
        self.handle_request(tx, port).inspect_err(|_| {
            self.cpu_ports[port].owe_retry();
        })
    }

    /// The requestor on `port` can take the response it refused earlier.
    ///
    /// # Panics
    ///
    /// Panics if `port` is out of range or holds no blocked response.
    pub fn recv_resp_retry(&mut self, port: PortId) {
        self.cpu_ports[port].recv_resp_retry();
    }

    /// Untimed access: answered from a resident block, otherwise by memory.
    ///
    /// Touches neither the in-flight state nor the scheduler, so it is safe at any
    /// time, including while a timed access is outstanding.
    pub fn recv_functional(&mut self, tx: &mut Transaction) {
        debug!(cache = %self.name, %tx, "recv_functional");
        if self.access_functional(tx) {
            tx.make_response();
        } else {
            self.mem_port.send_functional(tx);
        }
    }

    /// Address ranges served through the cache, which are those of the memory.
    pub fn address_ranges(&self) -> Vec<AddrRange> {
        self.mem_port.address_ranges()
    }

    // ──────────────────────────────────────────────────────────
    // Memory side
    // ──────────────────────────────────────────────────────────

    /// Response from memory for the outstanding miss.
    ///
    /// # Panics
    ///
    /// Panics if no access is in flight, or if the response cannot be stored.
    pub fn recv_timing_resp(&mut self, tx: Transaction) {
        debug!(cache = %self.name, %tx, "recv_timing_resp");
        assert!(self.blocked, "{}: response {} while no access is in flight", self.name, tx);

        self.insert(&tx);

        let response = match self.pending_upgrade.take() {
            Some(mut original) => {
                trace!(cache = %self.name, %original, "completing upgraded request");
                let hit = self.access_functional(&mut original);
                assert!(hit, "{}: should always hit after inserting", self.name);
                original.make_response();
                original
            }
            None => tx,
        };

        self.send_response(response);
    }

    /// Memory can take the request it refused earlier.
    ///
    /// # Panics
    ///
    /// Panics if no request is blocked on the memory-side port.
    pub fn recv_req_retry(&mut self) {
        self.mem_port.recv_req_retry();
        if !self.blocked && !self.mem_port.is_blocked() {
            self.offer_retries();
        }
    }

    /// Memory's address ranges changed; tell every requestor.
    pub fn recv_range_change(&mut self) {
        debug!(cache = %self.name, "recv_range_change");
        for port in &mut self.cpu_ports {
            port.send_range_change();
        }
    }

    /// Runs a deferred action handed back by the scheduler.
    pub fn process(&mut self, event: CacheEvent) {
        match event {
            CacheEvent::AccessTiming(tx) => self.access_timing(tx),
        }
    }

    // ──────────────────────────────────────────────────────────
    // Controller
    // ──────────────────────────────────────────────────────────

    fn handle_request(&mut self, tx: Transaction, port: PortId) -> Result<(), Transaction> {
        if self.blocked {
            trace!(cache = %self.name, port, "cache busy");
            return Err(tx);
        }
        // A refused write-back still parked on the memory side would collide
        // with the next miss.
        if self.mem_port.is_blocked() {
            trace!(cache = %self.name, port, "memory side blocked");
            return Err(tx);
        }

        trace!(cache = %self.name, addr = format_args!("{:#x}", tx.addr()), port, "request admitted");
        self.blocked = true;
        assert!(
            self.waiting_port.is_none(),
            "{}: admission while port {:?} is still waiting",
            self.name,
            self.waiting_port
        );
        self.waiting_port = Some(port);

        self.scheduler
            .schedule_after(self.latency, CacheEvent::AccessTiming(tx));
        Ok(())
    }

    fn access_timing(&mut self, mut tx: Transaction) {
        let hit = self.access_functional(&mut tx);
        trace!(cache = %self.name, %tx, hit, "access");

        if hit {
            tx.make_response();
            self.send_response(tx);
            return;
        }

        if tx.is_whole_block(self.block_size) {
            trace!(cache = %self.name, "forwarding block request");
            self.mem_port.send_packet(tx);
            return;
        }

        assert!(
            !tx.spans_blocks(self.block_size),
            "{}: cannot handle access that spans multiple blocks: {}",
            self.name,
            tx
        );
        assert!(tx.needs_response(), "{}: cannot upgrade {}", self.name, tx);

        let id = self.internal_id();
        let fetch = Transaction::block_fetch(&tx, self.block_size, id);
        trace!(cache = %self.name, original = %tx, %fetch, "upgrading to block size");
        self.pending_upgrade = Some(tx);
        self.mem_port.send_packet(fetch);
    }

    /// Copies between `tx` and its resident block; `false` on a miss.
    fn access_functional(&mut self, tx: &mut Transaction) -> bool {
        let Some(block) = self.store.lookup_mut(tx.addr()) else {
            return false;
        };
        if tx.is_write() {
            tx.write_data_to_block(block.data_mut());
        } else if tx.is_read() {
            tx.set_data_from_block(block.data());
        } else {
            panic!("{}: unknown transaction type {:?}", self.name, tx.cmd());
        }
        true
    }

    /// Stores the block carried by a memory response, evicting first when full.
    fn insert(&mut self, tx: &Transaction) {
        let addr = tx.addr();
        assert_eq!(
            addr,
            tx.block_addr(self.block_size),
            "{}: inserted block {addr:#x} is not aligned",
            self.name
        );
        assert!(
            !self.store.contains(addr),
            "{}: block {addr:#x} is already resident",
            self.name
        );
        assert!(tx.is_response(), "{}: inserting a non-response {}", self.name, tx);
        assert_eq!(
            tx.size(),
            self.block_size,
            "{}: inserted transaction is not block sized",
            self.name
        );

        if self.store.is_full()
            && let Some(victim) = self.store.evict_random()
        {
            // Every resident block is treated as dirty.
            let id = self.internal_id();
            let writeback = Transaction::writeback(id, victim.addr(), victim.into_data().into_vec());
            debug!(cache = %self.name, %writeback, "writing back evicted block");
            self.mem_port.send_packet(writeback);
        }

        trace!(cache = %self.name, %tx, "inserting");
        self.store.insert(addr, tx.data().into());
    }

    fn send_response(&mut self, tx: Transaction) {
        assert!(self.blocked, "{}: responding while not blocked", self.name);
        let Some(port) = self.waiting_port.take() else {
            panic!("{}: responding with no waiting port", self.name);
        };
        debug!(cache = %self.name, port, %tx, "sending response");
        self.blocked = false;

        self.cpu_ports[port].send_packet(tx);
        self.offer_retries();
    }

    fn offer_retries(&mut self) {
        for port in &mut self.cpu_ports {
            port.try_send_retry();
        }
    }

    const fn internal_id(&mut self) -> TransactionId {
        let id = TransactionId(self.next_internal_id);
        self.next_internal_id = self.next_internal_id.wrapping_add(1) | INTERNAL_ID_BASE;
        id
    }
}

impl fmt::Debug for SimpleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleCache")
            .field("name", &self.name)
            .field("latency", &self.latency)
            .field("block_size", &self.block_size)
            .field("cpu_ports", &self.cpu_ports)
            .field("mem_port", &self.mem_port)
            .field("store", &self.store)
            .field("blocked", &self.blocked)
            .field("waiting_port", &self.waiting_port)
            .field("pending_upgrade", &self.pending_upgrade)
            .finish_non_exhaustive()
    }
}
