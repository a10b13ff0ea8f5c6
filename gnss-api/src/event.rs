//! Raw events delivered by the location engine
//!
//! One [`RawEvent`] is constructed per primitive protocol event and handed
//! to the registered [`EventSink`](crate::EventSink). Wire-level validity
//! bitmasks are expressed as `Option` fields, so a consumer cannot read a
//! field without first confirming it was reported. Wire values that may
//! carry codes this crate does not know about (engine state, satellite
//! constellation, assistance-data kind) stay raw `u32` codes with named
//! constants, so an unrecognized value remains representable.

use serde::{Deserialize, Serialize};

/// Raw engine-state code: engine powered on, session running
pub const ENGINE_STATE_ON: u32 = 1;
/// Raw engine-state code: engine powered off
pub const ENGINE_STATE_OFF: u32 = 2;

/// Satellite constellation code: GPS (PRN 1-32)
pub const SV_SYSTEM_GPS: u32 = 1;
/// Satellite constellation code: SBAS (PRN 120-151)
pub const SV_SYSTEM_SBAS: u32 = 2;
/// Satellite constellation code: GLONASS (slot 1-32)
pub const SV_SYSTEM_GLONASS: u32 = 3;

/// Satellite process-status code: idle
pub const SV_STATUS_IDLE: u32 = 1;
/// Satellite process-status code: searching
pub const SV_STATUS_SEARCH: u32 = 2;
/// Satellite process-status code: tracking (contributing to the fix)
pub const SV_STATUS_TRACK: u32 = 3;

/// Assistance-data request code: predicted orbit (XTRA) download
pub const ASSIST_DATA_PREDICTED_ORBITS: u32 = 1;

/// A single raw notification from the location engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawEvent {
    Position(PositionReport),
    Satellite(SatelliteReport),
    Status(StatusReport),
    Nmea(NmeaReport),
    AssistDataRequest(AssistDataRequest),
    ControlReport(ControlReport),
    ServerRequest(ServerRequest),
    NiNotify(NiNotification),
}

/// Outcome the engine attached to a position report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Success,
    InProgress,
    GeneralFailure,
    Timeout,
    UserTerminated,
}

/// A parsed position report; every field is present only if the engine
/// flagged it valid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionReport {
    pub session_status: Option<SessionStatus>,
    /// UTC timestamp in epoch milliseconds
    pub timestamp_utc_ms: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Altitude with respect to the ellipsoid, meters
    pub altitude: Option<f64>,
    /// Horizontal speed component, m/s
    pub speed_horizontal: Option<f32>,
    /// Vertical speed component, m/s
    pub speed_vertical: Option<f32>,
    /// Heading in degrees
    pub heading: Option<f32>,
    /// Circular horizontal uncertainty, meters
    pub accuracy: Option<f32>,
}

/// One satellite entry inside a [`SatelliteReport`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SvInfo {
    /// Constellation code (`SV_SYSTEM_*`); unknown codes are possible
    pub system: Option<u32>,
    /// Constellation-specific identifier (PRN or slot id)
    pub prn: u16,
    /// Signal-to-noise ratio, dB-Hz
    pub snr: Option<f32>,
    /// Elevation in degrees
    pub elevation: Option<f32>,
    /// Azimuth in degrees
    pub azimuth: Option<f32>,
    pub has_ephemeris: Option<bool>,
    pub has_almanac: Option<bool>,
    /// Process-status code (`SV_STATUS_*`)
    pub process_status: Option<u32>,
}

/// Satellite visibility report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SatelliteReport {
    pub svs: Vec<SvInfo>,
}

/// Engine status transition report
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusReport {
    /// Raw engine-state code (`ENGINE_STATE_*`); unknown codes are possible
    pub engine_state: u32,
}

/// A raw NMEA sentence buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NmeaReport {
    pub sentence: String,
}

/// Request from the engine for assistance data
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssistDataRequest {
    /// Assistance-data kind code (`ASSIST_DATA_*`)
    pub kind: u32,
}

/// Opaque response to an earlier control request; interpreted by the
/// control collaborator, not by the dispatch core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlReport {
    pub payload: Vec<u8>,
}

/// Request to bring up or tear down the AGPS data connection
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ServerRequest {
    Open { conn_handle: u64 },
    Close { conn_handle: u64 },
}

/// Opaque network-initiated request; forwarded to the NI collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NiNotification {
    pub payload: Vec<u8>,
}
