//! Consumer-facing report shapes
//!
//! These are the types handed to registered callbacks. A field is `Some`
//! only if the engine flagged its source value valid; nothing is synthesized
//! from defaults.

use serde::{Deserialize, Serialize};

/// Maximum number of satellite records in one report; excess entries are
/// dropped, not an error
pub const MAX_SVS: usize = 32;

/// Engine status delivered to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineStatus {
    #[default]
    None,
    EngineOn,
    SessionBegin,
    EngineOff,
}

/// A translated position fix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// UTC timestamp in epoch milliseconds
    pub timestamp_utc_ms: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters above the ellipsoid
    pub altitude: Option<f64>,
    /// Ground speed in m/s, the Euclidean norm of the horizontal and
    /// vertical components
    pub speed: Option<f32>,
    /// Degrees
    pub bearing: Option<f32>,
    /// Circular horizontal uncertainty, meters
    pub accuracy: Option<f32>,
}

impl Location {
    /// True when the fix carries a valid latitude/longitude pair
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// One satellite in a [`SatelliteStatus`] report, identified in the
/// unified numbering space (GPS 1-32, SBAS 33-64, GLONASS 65-96)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SvRecord {
    pub id: u16,
    pub snr: Option<f32>,
    pub elevation: Option<f32>,
    pub azimuth: Option<f32>,
}

/// A translated satellite visibility report
///
/// The three masks carry bit-per-satellite semantics for GPS only:
/// bit `n` refers to PRN `n + 1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteStatus {
    pub svs: Vec<SvRecord>,
    pub ephemeris_mask: u32,
    pub almanac_mask: u32,
    pub used_in_fix_mask: u32,
}
