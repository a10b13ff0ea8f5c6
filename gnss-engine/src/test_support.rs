//! Shared fixtures for unit tests

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use gnss_api::{
    ClientError, ControlRequest, EventMask, EventSink, LocationClient, SessionHandle,
};

use crate::callbacks::GnssCallbacks;
use crate::engine::{EngineConfig, EngineShared};
use crate::report::{EngineStatus, Location, SatelliteStatus};

/// A client with no session; every control request fails
pub(crate) struct NullClient;

impl LocationClient for NullClient {
    fn open_session(
        &self,
        _events: EventMask,
        _sink: Arc<dyn EventSink>,
    ) -> gnss_api::Result<SessionHandle> {
        Err(ClientError::SessionRejected("null client".to_string()))
    }

    fn close_session(&self, _handle: SessionHandle) -> gnss_api::Result<()> {
        Ok(())
    }

    fn start_fix(&self, _handle: SessionHandle) -> gnss_api::Result<()> {
        Err(ClientError::InvalidHandle)
    }

    fn stop_fix(&self, _handle: SessionHandle) -> gnss_api::Result<()> {
        Err(ClientError::InvalidHandle)
    }

    fn control(
        &self,
        _handle: SessionHandle,
        _request: ControlRequest,
        _timeout: Duration,
    ) -> gnss_api::Result<()> {
        Err(ClientError::InvalidHandle)
    }
}

/// Shared engine state with a null client and zero handshake delay
pub(crate) fn make_shared() -> EngineShared {
    EngineShared::new(
        Arc::new(NullClient),
        EngineConfig {
            agps_handshake_delay: Duration::ZERO,
            ..EngineConfig::default()
        },
    )
}

#[derive(Debug)]
pub(crate) enum RecordedCall {
    Location(Location),
    SvStatus(SatelliteStatus),
    EngineStatus(EngineStatus),
    Nmea(i64, String),
}

/// Callbacks that forward every invocation to an mpsc channel
pub(crate) struct RecordingCallbacks {
    calls: mpsc::Sender<RecordedCall>,
}

impl RecordingCallbacks {
    pub(crate) fn channel() -> (RecordingCallbacks, mpsc::Receiver<RecordedCall>) {
        let (calls, receiver) = mpsc::channel();
        (RecordingCallbacks { calls }, receiver)
    }
}

impl GnssCallbacks for RecordingCallbacks {
    fn on_location(&self, location: &Location) {
        let _ = self.calls.send(RecordedCall::Location(location.clone()));
    }

    fn on_sv_status(&self, status: &SatelliteStatus) {
        let _ = self.calls.send(RecordedCall::SvStatus(status.clone()));
    }

    fn on_engine_status(&self, status: EngineStatus) {
        let _ = self.calls.send(RecordedCall::EngineStatus(status));
    }

    fn on_nmea(&self, timestamp_ms: i64, sentence: &str) {
        let _ = self
            .calls
            .send(RecordedCall::Nmea(timestamp_ms, sentence.to_string()));
    }
}
