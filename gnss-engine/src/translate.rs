//! Translation of raw engine events into consumer reports
//!
//! Pure translation lives in free functions; `process_event` is the single
//! dispatch path the deferred worker drives. State is read and written only
//! under the engine-state mutex, and the mutex is always released before a
//! consumer callback fires.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use gnss_api::{
    AssistDataRequest, PositionReport, RawEvent, SatelliteReport, SessionStatus, StatusReport,
    SvInfo, ASSIST_DATA_PREDICTED_ORBITS, ENGINE_STATE_OFF, ENGINE_STATE_ON, SV_STATUS_TRACK,
    SV_SYSTEM_GLONASS, SV_SYSTEM_GPS, SV_SYSTEM_SBAS,
};

use crate::agps;
use crate::engine::EngineShared;
use crate::error::{EngineError, Result};
use crate::report::{EngineStatus, Location, SatelliteStatus, SvRecord, MAX_SVS};

/// Window after a valid fix during which satellites with ephemeris are
/// assumed to have contributed to it. The lower-level protocol does not
/// report used-in-fix, so this approximation stands in for it.
pub const FIX_ASSOCIATION_WINDOW: Duration = Duration::from_secs(10);

/// Process one dequeued event end to end
pub(crate) fn process_event(shared: &EngineShared, event: RawEvent) -> Result<()> {
    match event {
        RawEvent::Position(report) => handle_position(shared, report),
        RawEvent::Satellite(report) => handle_satellite(shared, report),
        RawEvent::Status(report) => handle_status(shared, report),
        RawEvent::Nmea(report) => {
            if let Some(callbacks) = shared.callbacks.gnss() {
                callbacks.on_nmea(epoch_millis(), &report.sentence);
            }
            Ok(())
        }
        RawEvent::AssistDataRequest(request) => handle_assist_data(shared, request),
        RawEvent::ControlReport(report) => {
            match shared.callbacks.control_report() {
                Some(handler) => handler(&report),
                None => tracing::debug!("no control report handler registered, dropping report"),
            }
            Ok(())
        }
        RawEvent::ServerRequest(request) => {
            agps::handle_server_request(shared, request);
            Ok(())
        }
        RawEvent::NiNotify(notification) => {
            // always forwarded, unconditionally
            match shared.callbacks.ni() {
                Some(handler) => handler(&notification),
                None => tracing::debug!("no NI handler registered, dropping notification"),
            }
            Ok(())
        }
    }
}

fn handle_position(shared: &EngineShared, report: PositionReport) -> Result<()> {
    let Some(session_status) = report.session_status else {
        tracing::trace!("position report without session status, ignored");
        return Ok(());
    };
    if session_status != SessionStatus::Success {
        tracing::trace!(?session_status, "position report ignored");
        return Ok(());
    }

    let location = translate_position(&report);
    if location.has_position() {
        shared.state.lock().last_fix = Some(Instant::now());
    }

    if let Some(callbacks) = shared.callbacks.gnss() {
        callbacks.on_location(&location);
    }
    Ok(())
}

/// Build a [`Location`] from a successful position report, field by field,
/// each gated by its own validity
pub fn translate_position(report: &PositionReport) -> Location {
    let mut location = Location {
        timestamp_utc_ms: report.timestamp_utc_ms,
        altitude: report.altitude,
        bearing: report.heading,
        accuracy: report.accuracy,
        ..Location::default()
    };

    if let (Some(latitude), Some(longitude)) = (report.latitude, report.longitude) {
        location.latitude = Some(latitude);
        location.longitude = Some(longitude);
    }

    if let (Some(horizontal), Some(vertical)) = (report.speed_horizontal, report.speed_vertical) {
        location.speed = Some((horizontal * horizontal + vertical * vertical).sqrt());
    }

    location
}

fn handle_satellite(shared: &EngineShared, report: SatelliteReport) -> Result<()> {
    let last_fix = shared.state.lock().last_fix;
    let status = build_sv_status(&report, last_fix, Instant::now());

    if let Some(callbacks) = shared.callbacks.gnss() {
        callbacks.on_sv_status(&status);
    }
    Ok(())
}

/// Map one raw satellite entry into the unified numbering space.
/// GPS PRN 1-32 passes through, SBAS PRN 120-151 maps to 33-64, GLONASS
/// slot 1-32 maps to 65-96. Entries from unrecognized constellations or
/// outside their constellation's range are skipped.
fn unified_sv_id(sv: &SvInfo) -> Option<u16> {
    match sv.system? {
        SV_SYSTEM_GPS if (1..=32).contains(&sv.prn) => Some(sv.prn),
        SV_SYSTEM_SBAS if (120..=151).contains(&sv.prn) => Some(sv.prn - 120 + 33),
        SV_SYSTEM_GLONASS if (1..=32).contains(&sv.prn) => Some(sv.prn + 64),
        system => {
            tracing::trace!(system, prn = sv.prn, "skipping satellite");
            None
        }
    }
}

/// Build a [`SatelliteStatus`] from a raw report, bounded to [`MAX_SVS`]
/// records. Only GPS has bit-per-satellite mask semantics; the used-in-fix
/// fallback applies when no satellite is marked tracking and the last valid
/// fix is within [`FIX_ASSOCIATION_WINDOW`] of `now`.
pub fn build_sv_status(
    report: &SatelliteReport,
    last_fix: Option<Instant>,
    now: Instant,
) -> SatelliteStatus {
    let mut status = SatelliteStatus::default();

    for sv in report.svs.iter().take(MAX_SVS) {
        let Some(id) = unified_sv_id(sv) else {
            continue;
        };

        if sv.system == Some(SV_SYSTEM_GPS) {
            let bit = 1u32 << (sv.prn - 1);
            if sv.has_ephemeris == Some(true) {
                status.ephemeris_mask |= bit;
            }
            if sv.has_almanac == Some(true) {
                status.almanac_mask |= bit;
            }
            if sv.process_status == Some(SV_STATUS_TRACK) {
                status.used_in_fix_mask |= bit;
            }
        }

        status.svs.push(SvRecord {
            id,
            snr: sv.snr,
            elevation: sv.elevation,
            azimuth: sv.azimuth,
        });
    }

    if status.used_in_fix_mask == 0 {
        if let Some(fix_time) = last_fix {
            if now.duration_since(fix_time) < FIX_ASSOCIATION_WINDOW {
                status.used_in_fix_mask = status.ephemeris_mask;
            }
        }
    }

    status
}

fn handle_status(shared: &EngineShared, report: StatusReport) -> Result<()> {
    let delivered = match report.engine_state {
        ENGINE_STATE_ON => EngineStatus::SessionBegin,
        ENGINE_STATE_OFF => EngineStatus::EngineOff,
        other => {
            tracing::warn!(engine_state = other, "unhandled engine state");
            EngineStatus::None
        }
    };

    if delivered != EngineStatus::None {
        if let Some(callbacks) = shared.callbacks.gnss() {
            callbacks.on_engine_status(delivered);
        }
    }

    // the single authoritative status update path, even for None
    shared.state.lock().status = delivered;
    Ok(())
}

fn handle_assist_data(shared: &EngineShared, request: AssistDataRequest) -> Result<()> {
    if request.kind != ASSIST_DATA_PREDICTED_ORBITS {
        return Err(EngineError::Translation(format!(
            "unsupported assistance data kind {}",
            request.kind
        )));
    }

    match shared.callbacks.xtra_download_or_pending() {
        Some(callback) => callback(),
        None => tracing::debug!("no XTRA callback, download deferred until one is registered"),
    }
    Ok(())
}

/// Current wall-clock time in epoch milliseconds, as stamped on NMEA lines
pub(crate) fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
