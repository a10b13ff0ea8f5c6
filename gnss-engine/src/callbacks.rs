//! Consumer callback contracts and the callback registry
//!
//! Callbacks are registered as trait objects and invoked by the deferred
//! worker (or, for the AGPS handshake, the calling consumer context) with
//! no internal lock held: handles are cloned out of the registry first, so
//! a callback may re-enter any public operation without deadlocking.

use std::sync::Arc;

use parking_lot::RwLock;

use gnss_api::{ControlReport, NiNotification};

use crate::report::{EngineStatus, Location, SatelliteStatus};
use crate::state::AgpsSessionStatus;

/// AGPS flavor carried in status callbacks and server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgpsType {
    Supl,
    C2k,
}

/// Callbacks fired for translated engine reports
///
/// Every method has a no-op default; a consumer implements only what it
/// consumes. A missing callback is not an error.
pub trait GnssCallbacks: Send + Sync {
    fn on_location(&self, _location: &Location) {}
    fn on_sv_status(&self, _status: &SatelliteStatus) {}
    fn on_engine_status(&self, _status: EngineStatus) {}
    fn on_nmea(&self, _timestamp_ms: i64, _sentence: &str) {}
}

/// Callback fired when the data-connection handshake status changes
pub trait AgpsCallbacks: Send + Sync {
    fn on_status(&self, status: AgpsSessionStatus, kind: AgpsType);
}

type XtraDownloadFn = Arc<dyn Fn() + Send + Sync>;
type NiHandlerFn = Arc<dyn Fn(&NiNotification) + Send + Sync>;
type ControlReportFn = Arc<dyn Fn(&ControlReport) + Send + Sync>;

#[derive(Default)]
struct Registered {
    gnss: Option<Arc<dyn GnssCallbacks>>,
    agps: Option<Arc<dyn AgpsCallbacks>>,
    xtra_download: Option<XtraDownloadFn>,
    /// A download was requested before any XTRA callback was registered
    xtra_download_pending: bool,
    ni: Option<NiHandlerFn>,
    control_report: Option<ControlReportFn>,
}

/// Registry of everything the consumer has hooked up
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    inner: RwLock<Registered>,
}

impl CallbackRegistry {
    /// Drop all registrations and pending flags; used on re-init
    pub(crate) fn reset(&self) {
        *self.inner.write() = Registered::default();
    }

    pub(crate) fn register_gnss(&self, callbacks: Arc<dyn GnssCallbacks>) {
        self.inner.write().gnss = Some(callbacks);
    }

    pub(crate) fn register_agps(&self, callbacks: Arc<dyn AgpsCallbacks>) {
        self.inner.write().agps = Some(callbacks);
    }

    /// Register the XTRA download callback; returns true when a download
    /// request arrived earlier and the callback should fire immediately
    pub(crate) fn register_xtra_download(&self, callback: XtraDownloadFn) -> bool {
        let mut inner = self.inner.write();
        inner.xtra_download = Some(callback);
        std::mem::take(&mut inner.xtra_download_pending)
    }

    pub(crate) fn register_ni(&self, handler: NiHandlerFn) {
        self.inner.write().ni = Some(handler);
    }

    pub(crate) fn register_control_report(&self, handler: ControlReportFn) {
        self.inner.write().control_report = Some(handler);
    }

    pub(crate) fn gnss(&self) -> Option<Arc<dyn GnssCallbacks>> {
        self.inner.read().gnss.clone()
    }

    pub(crate) fn agps(&self) -> Option<Arc<dyn AgpsCallbacks>> {
        self.inner.read().agps.clone()
    }

    /// Hand out the XTRA download callback for a new request, or record
    /// the request as pending when none is registered yet
    pub(crate) fn xtra_download_or_pending(&self) -> Option<XtraDownloadFn> {
        let mut inner = self.inner.write();
        match inner.xtra_download.clone() {
            Some(callback) => Some(callback),
            None => {
                inner.xtra_download_pending = true;
                None
            }
        }
    }

    pub(crate) fn ni(&self) -> Option<NiHandlerFn> {
        self.inner.read().ni.clone()
    }

    pub(crate) fn control_report(&self) -> Option<ControlReportFn> {
        self.inner.read().control_report.clone()
    }
}
