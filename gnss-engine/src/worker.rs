//! The deferred worker thread
//!
//! One worker per initialized engine drains the event queue in order. It
//! watches the AGPS handshake status around every event and reports a
//! change to the consumer exactly once, after releasing the state lock.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::callbacks::AgpsType;
use crate::engine::EngineShared;
use crate::queue::{Dequeued, EventQueue};
use crate::state::AgpsSessionStatus;
use crate::translate;

pub(crate) fn spawn(
    queue: Arc<EventQueue>,
    shared: Arc<EngineShared>,
    ready_tx: mpsc::Sender<()>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("gnss-event-worker".to_string())
        .spawn(move || run(queue, shared, ready_tx))
}

fn run(queue: Arc<EventQueue>, shared: Arc<EngineShared>, ready_tx: mpsc::Sender<()>) {
    tracing::debug!("event worker started");
    // confirm readiness before the first dequeue; init blocks on this
    let _ = ready_tx.send(());

    loop {
        let event = match queue.dequeue_blocking() {
            Dequeued::Event(event) => event,
            Dequeued::Shutdown => break,
        };

        let before = shared.state.lock().agps_status;

        if let Err(error) = translate::process_event(&shared, event) {
            tracing::warn!(%error, "event processing failed");
        }

        let after = shared.state.lock().agps_status;
        if after != before && after != AgpsSessionStatus::Idle {
            if let Some(callbacks) = shared.callbacks.agps() {
                callbacks.on_status(after, AgpsType::Supl);
            }
        }
    }

    tracing::debug!("event worker exiting");
}
