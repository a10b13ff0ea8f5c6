//! Unbounded FIFO of pending engine events
//!
//! Producers (the transport's delivery contexts) append from any thread;
//! exactly one deferred worker drains. Insertion order is delivery order is
//! processing order: no priorities, no coalescing. Once shutdown has been
//! requested the worker is handed [`Dequeued::Shutdown`] even if events
//! remain; those are drained and discarded, never processed.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use gnss_api::{EventSink, RawEvent};

/// What `dequeue_blocking` hands the worker
#[derive(Debug)]
pub enum Dequeued {
    Event(RawEvent),
    Shutdown,
}

#[derive(Default)]
struct Inner {
    events: VecDeque<RawEvent>,
    shutdown: bool,
}

/// Thread-safe FIFO with blocking dequeue and cooperative shutdown
#[derive(Default)]
pub struct EventQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

impl EventQueue {
    pub fn new() -> Arc<EventQueue> {
        Arc::new(EventQueue::default())
    }

    /// Append an event and wake the worker if it is idle; never blocks the
    /// caller beyond lock acquisition
    pub fn enqueue(&self, event: RawEvent) {
        let mut inner = self.inner.lock();
        if inner.shutdown {
            tracing::debug!("queue is shut down, discarding event");
            return;
        }
        inner.events.push_back(event);
        self.available.notify_one();
    }

    /// Remove and return the head, suspending while the queue is empty;
    /// returns [`Dequeued::Shutdown`] once shutdown has been requested,
    /// regardless of pending items
    pub fn dequeue_blocking(&self) -> Dequeued {
        let mut inner = self.inner.lock();
        loop {
            if inner.shutdown {
                return Dequeued::Shutdown;
            }
            if let Some(event) = inner.events.pop_front() {
                return Dequeued::Event(event);
            }
            self.available.wait(&mut inner);
        }
    }

    /// Request cooperative shutdown and wake every waiter
    pub fn request_shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.shutdown = true;
        self.available.notify_all();
    }

    /// Drop all pending events, returning how many were discarded
    pub fn discard_pending(&self) -> usize {
        let mut inner = self.inner.lock();
        let discarded = inner.events.len();
        inner.events.clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }
}

impl EventSink for EventQueue {
    fn deliver(&self, event: RawEvent) {
        self.enqueue(event);
    }
}
