//! Shared engine state
//!
//! One [`EngineState`] exists per engine instance, guarded by a single
//! mutex. Public operations take the lock only for the narrow fields they
//! touch; the deferred worker takes it for the duration of translating one
//! event and never across a consumer callback.

use std::net::Ipv4Addr;
use std::time::Instant;

use gnss_api::{AidingData, PositionMode};

use crate::report::EngineStatus;

/// Data-connection handshake status as last communicated to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgpsSessionStatus {
    #[default]
    Idle,
    /// The engine asked for a data connection to be brought up
    Requested,
    /// The engine asked for the data connection to be torn down
    Released,
}

/// Session and configuration state shared between the public operations
/// and the deferred worker
#[derive(Debug, Default)]
pub struct EngineState {
    pub status: EngineStatus,
    pub position_mode: PositionMode,
    /// Monotonic time of the most recent report with a valid lat/lon pair
    pub last_fix: Option<Instant>,
    /// Aiding data accumulated for deletion; cleared once a deletion
    /// request has been issued
    pub pending_deletion: AidingData,
    pub apn: Option<String>,
    pub server_host: Option<String>,
    pub server_port: u16,
    /// Resolved server address, cached after the first successful lookup
    pub server_addr: Option<Ipv4Addr>,
    /// Correlates an open/close data-connection request with its outcome;
    /// the engine supports one live AGPS connection at a time
    pub conn_handle: Option<u64>,
    pub agps_status: AgpsSessionStatus,
}
