use memsim_core::sim::{CacheEvent, Cycles, Scheduler};
use memsim_core::soc::{PortId, Transaction};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Everything the test system can have pending at a future cycle.
#[derive(Debug)]
pub enum HarnessEvent {
    /// Deferred cache work, handed back through `SimpleCache::process`.
    Cache(CacheEvent),
    /// Memory has finished a request.
    MemResponse(Transaction),
    /// Memory can accept the request it refused.
    MemRetry,
    /// Requestor on the port can accept the response it refused.
    RespRetry(PortId),
    /// Requestor on the port should issue (or re-issue) its next request.
    Issue(PortId),
}

/// Discrete-event queue ordered by (cycle, insertion order).
#[derive(Debug, Default)]
pub struct EventQueue {
    now: Cycles,
    seq: u64,
    events: BTreeMap<(Cycles, u64), HarnessEvent>,
}

impl EventQueue {
    pub fn now(&self) -> Cycles {
        self.now
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn push_after(&mut self, delay: Cycles, event: HarnessEvent) {
        let key = (self.now + delay, self.seq);
        self.seq += 1;
        let _ = self.events.insert(key, event);
    }

    /// Removes the earliest event and advances time to it.
    pub fn pop(&mut self) -> Option<HarnessEvent> {
        let ((when, _), event) = self.events.pop_first()?;
        assert!(when >= self.now, "event queue went back in time");
        self.now = when;
        Some(event)
    }

    /// Cycle of the earliest pending event.
    pub fn next_at(&self) -> Option<Cycles> {
        self.events.keys().next().map(|&(when, _)| when)
    }

    /// Number of cache accesses waiting for their latency to elapse.
    pub fn cache_events(&self) -> usize {
        self.events
            .values()
            .filter(|event| matches!(event, HarnessEvent::Cache(_)))
            .count()
    }

    /// Cycle at which the earliest cache access is due, if any.
    pub fn next_cache_event_at(&self) -> Option<Cycles> {
        self.events
            .iter()
            .find(|(_, event)| matches!(event, HarnessEvent::Cache(_)))
            .map(|((when, _), _)| *when)
    }
}

pub type SharedQueue = Rc<RefCell<EventQueue>>;

/// `Scheduler` that feeds the shared event queue.
#[derive(Debug, Clone)]
pub struct QueueScheduler {
    queue: SharedQueue,
}

impl QueueScheduler {
    pub fn new(queue: SharedQueue) -> Self {
        Self { queue }
    }
}

impl Scheduler for QueueScheduler {
    fn schedule_after(&mut self, delay: Cycles, event: CacheEvent) {
        self.queue
            .borrow_mut()
            .push_after(delay, HarnessEvent::Cache(event));
    }
}

/// Scheduler that only records what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    pub scheduled: Rc<RefCell<Vec<(Cycles, CacheEvent)>>>,
}

impl Scheduler for RecordingScheduler {
    fn schedule_after(&mut self, delay: Cycles, event: CacheEvent) {
        self.scheduled.borrow_mut().push((delay, event));
    }
}
