//! The engine facade and its lifecycle
//!
//! [`LocEngine`] owns everything a session needs: the shared state, the
//! event queue the transport delivers into, and the deferred worker that
//! drains it. Public operations run on the caller's thread and return
//! before any resulting callback fires; callbacks always come from the
//! worker, except for the AGPS handshake which runs on the consumer's
//! context.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use gnss_api::{
    AidingData, ControlRequest, EventMask, FixCriteria, LocationClient, LockMode, PositionMode,
    Recurrence, SessionHandle,
};

use crate::agps::{self, ConnectionOutcome};
use crate::callbacks::{AgpsCallbacks, AgpsType, CallbackRegistry, GnssCallbacks};
use crate::error::{EngineError, Result};
use crate::queue::EventQueue;
use crate::report::EngineStatus;
use crate::state::EngineState;
use crate::worker;

const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(1);

/// Tunables for one engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Settle time slept before and after informing the engine of a
    /// data-connection outcome; zero skips the sleeps
    pub agps_handshake_delay: Duration,
    /// How long init waits for the worker to confirm it is running
    pub worker_start_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            agps_handshake_delay: Duration::from_secs(1),
            worker_start_timeout: Duration::from_secs(5),
        }
    }
}

/// State shared between the facade, the worker, and the AGPS helpers
pub(crate) struct EngineShared {
    pub(crate) client: Arc<dyn LocationClient>,
    pub(crate) config: EngineConfig,
    pub(crate) state: Mutex<EngineState>,
    pub(crate) callbacks: CallbackRegistry,
    pub(crate) session: Mutex<Option<SessionHandle>>,
    clock_origin: Instant,
}

impl EngineShared {
    pub(crate) fn new(client: Arc<dyn LocationClient>, config: EngineConfig) -> EngineShared {
        EngineShared {
            client,
            config,
            state: Mutex::new(EngineState::default()),
            callbacks: CallbackRegistry::default(),
            session: Mutex::new(None),
            clock_origin: Instant::now(),
        }
    }

    /// Issue one control request on the live session
    pub(crate) fn control(&self, request: ControlRequest) -> Result<()> {
        let handle = (*self.session.lock()).ok_or(EngineError::NotInitialized)?;

        self.client
            .control(handle, request, DEFAULT_CONTROL_TIMEOUT)
            .map_err(|error| {
                tracing::warn!(%error, "control request failed");
                EngineError::ControlRequestFailed
            })
    }

    /// Milliseconds elapsed on this instance's monotonic clock
    pub(crate) fn monotonic_ms(&self) -> i64 {
        self.clock_origin.elapsed().as_millis() as i64
    }
}

/// The location-engine adapter
///
/// Construct once per transport client, then drive the lifecycle with
/// [`init`](LocEngine::init) and [`cleanup`](LocEngine::cleanup).
pub struct LocEngine {
    shared: Arc<EngineShared>,
    queue: Arc<EventQueue>,
    worker: Option<JoinHandle<()>>,
}

impl LocEngine {
    pub fn new(client: Arc<dyn LocationClient>) -> LocEngine {
        LocEngine::with_config(client, EngineConfig::default())
    }

    pub fn with_config(client: Arc<dyn LocationClient>, config: EngineConfig) -> LocEngine {
        LocEngine {
            shared: Arc::new(EngineShared::new(client, config)),
            queue: EventQueue::new(),
            worker: None,
        }
    }

    /// Bring the engine up: reset state, start the worker, open the event
    /// session, and release the engine lock
    ///
    /// Fails with [`EngineError::AlreadyActive`] while a previous init has
    /// not been cleaned up.
    pub fn init(&mut self, callbacks: Arc<dyn GnssCallbacks>) -> Result<()> {
        {
            let state = self.shared.state.lock();
            match state.status {
                EngineStatus::None | EngineStatus::EngineOff => {}
                _ => return Err(EngineError::AlreadyActive),
            }
        }

        // an init that failed past worker startup left its worker parked on
        // the old queue; reclaim it before the queue is replaced
        if let Some(handle) = self.worker.take() {
            self.queue.request_shutdown();
            if handle.join().is_err() {
                tracing::warn!("event worker panicked");
            }
        }

        *self.shared.state.lock() = EngineState::default();
        self.shared.callbacks.reset();
        self.shared.callbacks.register_gnss(callbacks);

        // fresh queue per init; a previous shutdown poisons the old one
        self.queue = EventQueue::new();

        let (ready_tx, ready_rx) = mpsc::channel();
        let handle = worker::spawn(
            Arc::clone(&self.queue),
            Arc::clone(&self.shared),
            ready_tx,
        )
        .map_err(|error| {
            tracing::warn!(%error, "failed to spawn event worker");
            EngineError::WorkerUnresponsive
        })?;
        if ready_rx
            .recv_timeout(self.shared.config.worker_start_timeout)
            .is_err()
        {
            self.queue.request_shutdown();
            let _ = handle.join();
            return Err(EngineError::WorkerUnresponsive);
        }
        self.worker = Some(handle);

        let sink: Arc<dyn gnss_api::EventSink> = self.queue.clone();
        let session = self.shared.client.open_session(EventMask::ALL, sink)?;
        *self.shared.session.lock() = Some(session);
        tracing::info!(handle = session.0, "session opened");

        if let Err(error) = self.shared.control(ControlRequest::SetEngineLock(LockMode::None)) {
            tracing::warn!(%error, "failed to release engine lock");
        }

        self.shared.state.lock().status = EngineStatus::EngineOn;
        Ok(())
    }

    /// Tear the engine down: stop the worker, discard unprocessed events,
    /// and close the session
    ///
    /// Safe to call on an engine that was never initialized.
    pub fn cleanup(&mut self) {
        self.queue.request_shutdown();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::warn!("event worker panicked");
            }
        }

        let discarded = self.queue.discard_pending();
        if discarded > 0 {
            tracing::debug!(discarded, "dropped unprocessed events");
        }

        if let Some(session) = self.shared.session.lock().take() {
            if let Err(error) = self.shared.client.close_session(session) {
                tracing::warn!(%error, "failed to close session");
            }
        }

        self.shared.state.lock().status = EngineStatus::EngineOff;
    }

    /// Start a positioning session with the previously configured criteria
    ///
    /// An assisted mode with a configured server pushes the server address
    /// first; a push failure is logged, not fatal.
    pub fn start(&self) -> Result<()> {
        let wants_server = {
            let state = self.shared.state.lock();
            state.position_mode != PositionMode::Standalone
                && state.server_host.is_some()
                && state.server_port != 0
        };
        if wants_server {
            if let Err(error) = agps::configure_server(&self.shared) {
                tracing::warn!(%error, "AGPS server configuration failed");
            }
        }

        let handle = (*self.shared.session.lock()).ok_or(EngineError::NotInitialized)?;
        self.shared.client.start_fix(handle)?;
        Ok(())
    }

    /// Stop the positioning session; a deletion accumulated during the
    /// session is issued now unless the engine still reports it running
    pub fn stop(&self) -> Result<()> {
        let handle = (*self.shared.session.lock()).ok_or(EngineError::NotInitialized)?;
        if let Err(error) = self.shared.client.stop_fix(handle) {
            tracing::warn!(%error, "stop request failed");
        }

        let (pending, status) = {
            let state = self.shared.state.lock();
            (!state.pending_deletion.is_empty(), state.status)
        };
        if pending {
            if status == EngineStatus::SessionBegin {
                tracing::warn!("session still running, deferring aiding data deletion");
            } else {
                self.issue_aiding_deletion()?;
            }
        }
        Ok(())
    }

    fn issue_aiding_deletion(&self) -> Result<()> {
        if self.shared.session.lock().is_none() {
            // no session to carry the request; the mask stays pending
            return Err(EngineError::NotInitialized);
        }
        let mask = {
            let mut state = self.shared.state.lock();
            let mask = state.pending_deletion;
            // cleared regardless of the request outcome
            state.pending_deletion = AidingData::empty();
            mask
        };
        tracing::info!(mask = mask.bits(), "deleting aiding data");
        self.shared.control(ControlRequest::DeleteAssistData(mask))
    }

    /// Request deletion of aiding data; issued immediately unless a
    /// session is running, in which case it accumulates until stop
    pub fn delete_aiding_data(&self, mask: AidingData) -> Result<()> {
        let defer = {
            let mut state = self.shared.state.lock();
            if mask == AidingData::ALL {
                state.pending_deletion = AidingData::ALL;
            } else {
                state.pending_deletion |= mask;
            }
            state.status == EngineStatus::SessionBegin
        };
        if defer {
            tracing::debug!("session running, aiding data deletion deferred");
            return Ok(());
        }
        self.issue_aiding_deletion()
    }

    /// Record the positioning mode and push the fix criteria
    pub fn set_position_mode(&self, mode: PositionMode, interval_secs: u32) -> Result<()> {
        self.shared.state.lock().position_mode = mode;
        self.shared.control(ControlRequest::SetFixCriteria(FixCriteria {
            min_interval: Duration::from_secs(u64::from(interval_secs)),
            mode,
            recurrence: Recurrence::Periodic,
        }))
    }

    /// Inject a UTC time observation
    ///
    /// `reference_ms` is the caller's monotonic timestamp at which `utc_ms`
    /// was valid; the value is aged forward to now before injection.
    pub fn inject_time(&self, utc_ms: i64, reference_ms: i64, uncertainty_ms: u32) -> Result<()> {
        let aged = utc_ms + (self.shared.monotonic_ms() - reference_ms);
        self.shared.control(ControlRequest::InjectUtcTime {
            utc_ms: aged,
            uncertainty_ms,
        })
    }

    /// Inject a coarse position observation
    pub fn inject_location(&self, latitude: f64, longitude: f64, accuracy: f32) -> Result<()> {
        self.shared.control(ControlRequest::InjectPosition {
            latitude,
            longitude,
            accuracy,
        })
    }

    /// Hook up the AGPS status callback
    pub fn agps_init(&self, callbacks: Arc<dyn AgpsCallbacks>) {
        self.shared.callbacks.register_agps(callbacks);
    }

    /// Report that the consumer brought the data connection up
    pub fn agps_data_conn_open(&self, apn: &str) -> Result<()> {
        self.shared.state.lock().apn = Some(apn.to_string());
        agps::report_connection_outcome(&self.shared, ConnectionOutcome::OpenSucceeded)
    }

    /// Report that the consumer failed to bring the data connection up
    pub fn agps_data_conn_failed(&self) -> Result<()> {
        agps::report_connection_outcome(&self.shared, ConnectionOutcome::OpenFailed)
    }

    /// Report that the consumer tore the data connection down
    pub fn agps_data_conn_closed(&self) -> Result<()> {
        agps::report_connection_outcome(&self.shared, ConnectionOutcome::Closed)
    }

    /// Record the AGPS server for assisted sessions; only SUPL is carried
    /// by this transport
    pub fn agps_set_server(&self, kind: AgpsType, host: &str, port: u16) -> Result<()> {
        if kind != AgpsType::Supl {
            return Err(EngineError::Unsupported("only SUPL servers are supported"));
        }
        let mut state = self.shared.state.lock();
        if state.server_host.as_deref() != Some(host) {
            state.server_addr = None;
        }
        state.server_host = Some(host.to_string());
        state.server_port = port;
        Ok(())
    }

    /// Register the predicted-orbit download callback; fires immediately
    /// when the engine already asked for a download
    pub fn set_xtra_download_callback(&self, callback: Arc<dyn Fn() + Send + Sync>) {
        let fire_now = self.shared.callbacks.register_xtra_download(Arc::clone(&callback));
        if fire_now {
            callback();
        }
    }

    pub fn set_ni_handler(
        &self,
        handler: Arc<dyn Fn(&gnss_api::NiNotification) + Send + Sync>,
    ) {
        self.shared.callbacks.register_ni(handler);
    }

    pub fn set_control_report_handler(
        &self,
        handler: Arc<dyn Fn(&gnss_api::ControlReport) + Send + Sync>,
    ) {
        self.shared.callbacks.register_control_report(handler);
    }

    pub fn status(&self) -> EngineStatus {
        self.shared.state.lock().status
    }

    /// Milliseconds on this instance's monotonic clock, the reference for
    /// [`inject_time`](LocEngine::inject_time)
    pub fn elapsed_ms(&self) -> i64 {
        self.shared.monotonic_ms()
    }
}

impl Drop for LocEngine {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.cleanup();
        }
    }
}
