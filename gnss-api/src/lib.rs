//! Location service client boundary for the GNSS HAL adapter
//!
//! This crate defines the types exchanged with the underlying location
//! engine transport: raw engine events, control requests, and the
//! [`LocationClient`] trait the dispatch core drives. It carries no
//! protocol plumbing of its own; implementations live behind the trait.
//!
//! # Architecture
//!
//! ```text
//! LocationClient ──delivers──▶ EventSink (raw events, any thread)
//!        ▲
//!        └──control requests── dispatch core (gnss-engine)
//! ```

pub mod client;
pub mod control;
pub mod error;
pub mod event;

pub use client::{EventMask, EventSink, LocationClient, SessionHandle};
pub use control::{
    AidingData, ControlRequest, DataConnOpenStatus, FixCriteria, LockMode, PositionMode,
    Recurrence,
};
pub use error::{ClientError, Result};
pub use event::{
    AssistDataRequest, ControlReport, NiNotification, NmeaReport, PositionReport, RawEvent,
    SatelliteReport, ServerRequest, SessionStatus, StatusReport, SvInfo,
    ASSIST_DATA_PREDICTED_ORBITS, ENGINE_STATE_OFF, ENGINE_STATE_ON, SV_STATUS_IDLE,
    SV_STATUS_SEARCH, SV_STATUS_TRACK, SV_SYSTEM_GLONASS, SV_SYSTEM_GPS, SV_SYSTEM_SBAS,
};
