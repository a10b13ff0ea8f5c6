//! Control requests issued to the location engine
//!
//! A control request is a discriminated one-shot exchange: the dispatch
//! core builds a [`ControlRequest`] and the client implementation answers
//! success or failure within a bounded timeout.

use std::ops::{BitOr, BitOrAssign};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Positioning mode requested by the consumer and carried in the fix
/// criteria sent to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositionMode {
    #[default]
    Standalone,
    MsBased,
    MsAssisted,
}

/// Engine lock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockMode {
    None,
    MobileInitiated,
    MobileTerminated,
    All,
}

/// Fix recurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recurrence {
    Periodic,
    Single,
}

/// Criteria for a tracking session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixCriteria {
    pub min_interval: Duration,
    pub mode: PositionMode,
    pub recurrence: Recurrence,
}

/// Bitmask of aiding data categories to invalidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AidingData(u32);

impl AidingData {
    pub const EPHEMERIS: AidingData = AidingData(0x0001);
    pub const ALMANAC: AidingData = AidingData(0x0002);
    pub const POSITION: AidingData = AidingData(0x0004);
    pub const TIME: AidingData = AidingData(0x0008);
    pub const IONO: AidingData = AidingData(0x0010);
    pub const UTC: AidingData = AidingData(0x0020);
    pub const HEALTH: AidingData = AidingData(0x0040);
    pub const SV_DIRECTION: AidingData = AidingData(0x0080);
    pub const SV_STEER: AidingData = AidingData(0x0100);
    pub const SA_DATA: AidingData = AidingData(0x0200);
    pub const RTI: AidingData = AidingData(0x0400);
    pub const CELLDB_INFO: AidingData = AidingData(0x8000);
    /// Delete-everything sentinel; absorbs any other mask
    pub const ALL: AidingData = AidingData(0xFFFF_FFFF);

    pub const fn empty() -> AidingData {
        AidingData(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: AidingData) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AidingData {
    type Output = AidingData;

    fn bitor(self, rhs: AidingData) -> AidingData {
        AidingData(self.0 | rhs.0)
    }
}

impl BitOrAssign for AidingData {
    fn bitor_assign(&mut self, rhs: AidingData) {
        self.0 |= rhs.0;
    }
}

/// Result of the consumer's attempt to establish the AGPS data connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataConnOpenStatus {
    /// Connection is up; carries the APN it was brought up on
    Success { apn: Option<String> },
    Failure,
}

/// A discriminated request/response exchange with the location engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlRequest {
    SetEngineLock(LockMode),
    SetFixCriteria(FixCriteria),
    InjectUtcTime { utc_ms: i64, uncertainty_ms: u32 },
    InjectPosition { latitude: f64, longitude: f64, accuracy: f32 },
    DeleteAssistData(AidingData),
    /// Configure the AGPS server address as a `host:port` URL string
    SetServerAddress { url: String },
    /// Report the outcome of an earlier data-connection open request
    InformServerOpen { conn_handle: u64, status: DataConnOpenStatus },
    /// Report that an earlier data-connection close request completed
    InformServerClose { conn_handle: u64 },
}
