//! # Cache Consistency Properties
//!
//! Random access streams are replayed against a flat byte array. The cache must
//! return what the flat model returns, and after the run every byte must be
//! visible either in its resident block or in memory.
//!
//! The multi-port streams also refuse memory requests and responses at random,
//! and check after every event that at most one transaction sits between
//! admission and reply.

use crate::common::harness::{TestSystem, tiny_config};
use memsim_core::soc::{Command, Port, Transaction, TransactionId};
use proptest::prelude::*;

const BLOCK: usize = 64;
const BLOCKS: u64 = 6;
const PORTS: usize = 3;
/// Blocks owned by each port in the multi-port streams.
const BLOCKS_PER_PORT: u64 = BLOCKS / PORTS as u64;
const MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone)]
struct Op {
    write: bool,
    addr: u64,
    size: usize,
    fill: u8,
}

fn op() -> impl Strategy<Value = Op> {
    (
        any::<bool>(),
        0..BLOCKS,
        0..BLOCK,
        prop::sample::select(vec![1usize, 2, 4, 8]),
        any::<u8>(),
    )
        .prop_map(|(write, block, offset, size, fill)| Op {
            write,
            addr: block * BLOCK as u64 + offset.min(BLOCK - size) as u64,
            size,
            fill,
        })
}

/// Refusal pattern applied to one requestor.
#[derive(Debug, Clone)]
struct Stall {
    refuse: usize,
    delay: u64,
}

fn stall() -> impl Strategy<Value = Stall> {
    (0..4usize, 0..20u64).prop_map(|(refuse, delay)| Stall { refuse, delay })
}

/// Number of transactions admitted by the cache and not yet replied to.
fn in_flight(sys: &TestSystem) -> usize {
    let parked = sys
        .cache
        .mem_port()
        .blocked_packet()
        .is_some_and(Transaction::needs_response);
    sys.queue.borrow().cache_events() + sys.memory.borrow().outstanding + usize::from(parked)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reads_observe_every_earlier_write(ops in prop::collection::vec(op(), 1..40)) {
        let mut sys = TestSystem::new(&tiny_config(1));
        let mut model = vec![0u8; BLOCKS as usize * BLOCK];
        let mut expected = Vec::new();

        for (i, op) in ops.iter().enumerate() {
            let id = TransactionId(i as u64 + 1);
            let start = op.addr as usize;
            let end = start + op.size;
            if op.write {
                let data = vec![op.fill; op.size];
                model[start..end].copy_from_slice(&data);
                sys.enqueue(0, Transaction::write(id, op.addr, data));
            } else {
                expected.push((id, model[start..end].to_vec()));
                sys.enqueue(0, Transaction::read(id, op.addr, op.size));
            }
        }
        sys.run();

        prop_assert_eq!(sys.responses(0).len(), ops.len());
        for (id, bytes) in expected {
            prop_assert_eq!(sys.response_data(0, id), bytes);
        }

        // Each block is either resident (and authoritative) or fully in memory.
        for block in 0..BLOCKS {
            let addr = block * BLOCK as u64;
            let range = addr as usize..addr as usize + BLOCK;
            let visible = match sys.cache.store().lookup(addr) {
                Some(resident) => resident.data().to_vec(),
                None => sys.memory_bytes(addr, BLOCK),
            };
            prop_assert_eq!(visible, model[range].to_vec());
        }
    }

    #[test]
    fn residency_is_fills_minus_writebacks(ops in prop::collection::vec(op(), 1..40)) {
        let mut sys = TestSystem::new(&tiny_config(1));
        for (i, op) in ops.iter().enumerate() {
            let id = TransactionId(i as u64 + 1);
            sys.enqueue(0, Transaction::read(id, op.addr, op.size));
        }
        sys.run();

        let memory = sys.memory.borrow();
        let fills = memory
            .accepted
            .iter()
            .filter(|req| req.cmd == Command::Read)
            .count();
        let store = sys.cache.store();
        prop_assert!(store.len() <= store.capacity());
        prop_assert_eq!(fills - memory.writebacks.len(), store.len());
        prop_assert!(memory.accepted.iter().all(|req| req.size == BLOCK));
    }

    #[test]
    fn every_port_gets_one_reply_per_request(
        streams in prop::collection::vec(prop::collection::vec(op(), 1..12), PORTS),
        stalls in prop::collection::vec(stall(), PORTS),
        mem_refuse in 0..6usize,
        mem_retry_delay in 1..8u64,
    ) {
        let mut sys = TestSystem::new(&tiny_config(PORTS));
        {
            let mut memory = sys.memory.borrow_mut();
            memory.refuse_next = mem_refuse;
            memory.retry_delay = mem_retry_delay;
        }
        for (cpu, stall) in sys.cpus.iter().zip(&stalls) {
            let mut cpu = cpu.borrow_mut();
            cpu.refuse_next = stall.refuse;
            cpu.resp_retry_delay = stall.delay;
        }

        // Each port works on its own blocks, so its program order fixes what it reads.
        let mut model = vec![0u8; BLOCKS as usize * BLOCK];
        let mut issued = vec![Vec::new(); PORTS];
        let mut expected = Vec::new();
        for (port, stream) in streams.iter().enumerate() {
            let base = port as u64 * BLOCKS_PER_PORT * BLOCK as u64;
            for op in stream {
                let addr = base + op.addr % (BLOCKS_PER_PORT * BLOCK as u64);
                let start = addr as usize;
                let end = start + op.size;
                let id = sys.next_id();
                if op.write {
                    let data = vec![op.fill; op.size];
                    model[start..end].copy_from_slice(&data);
                    sys.enqueue(port, Transaction::write(id, addr, data));
                } else {
                    expected.push((port, id, model[start..end].to_vec()));
                    sys.enqueue(port, Transaction::read(id, addr, op.size));
                }
                issued[port].push(id);
            }
        }

        let mut steps = 0;
        while sys.step() {
            steps += 1;
            prop_assert!(steps < MAX_STEPS, "test system did not settle");
            prop_assert_eq!(sys.cache.is_blocked(), sys.cache.waiting_port().is_some());
            prop_assert!(sys.memory.borrow().outstanding <= 1);
            let admitted = in_flight(&sys);
            prop_assert!(admitted <= 1, "{} transactions in flight", admitted);
            prop_assert_eq!(admitted == 1, sys.cache.is_blocked());
        }

        for (port, ids) in issued.iter().enumerate() {
            let served: Vec<_> = sys.responses(port).iter().map(Transaction::id).collect();
            prop_assert_eq!(&served, ids);
            prop_assert_eq!(sys.pending(port), 0);
            prop_assert!(!sys.cache.cpu_port(port).is_blocked());
            prop_assert!(!sys.cache.cpu_port(port).needs_retry());
        }
        for (port, id, bytes) in expected {
            prop_assert_eq!(sys.response_data(port, id), bytes);
        }
        prop_assert!(!sys.cache.is_blocked());
        prop_assert!(!sys.cache.mem_port().is_blocked());
    }
}
