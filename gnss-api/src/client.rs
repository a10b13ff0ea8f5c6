//! The location service client contract
//!
//! [`LocationClient`] abstracts the transport that talks to the location
//! engine, the same way a decoder source is abstracted behind a receiver
//! trait: the dispatch core never sees RPC details, only sessions, control
//! requests, and raw events pushed into its [`EventSink`].

use std::ops::BitOr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::RawEvent;
use crate::ControlRequest;

/// Opaque identifier for an open engine session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionHandle(pub u64);

/// Bitmask of event kinds a session registers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventMask(u32);

impl EventMask {
    pub const POSITION: EventMask = EventMask(0x01);
    pub const SATELLITE: EventMask = EventMask(0x02);
    pub const STATUS: EventMask = EventMask(0x04);
    pub const NMEA: EventMask = EventMask(0x08);
    pub const ASSIST_DATA_REQUEST: EventMask = EventMask(0x10);
    pub const CONTROL_REPORT: EventMask = EventMask(0x20);
    pub const SERVER_REQUEST: EventMask = EventMask(0x40);
    pub const NI_NOTIFY: EventMask = EventMask(0x80);
    /// Every event kind the dispatch core handles
    pub const ALL: EventMask = EventMask(0xFF);

    pub const fn empty() -> EventMask {
        EventMask(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

/// Producer entry point for raw events
///
/// Called from arbitrary transport contexts; implementations must be cheap
/// and must never call back into consumer code.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: RawEvent);
}

/// Transport to the location engine
pub trait LocationClient: Send + Sync {
    /// Open a session registered for the given event kinds; the transport
    /// delivers matching events to `sink` from its own contexts
    fn open_session(&self, events: EventMask, sink: Arc<dyn EventSink>) -> Result<SessionHandle>;

    /// Close a previously opened session
    fn close_session(&self, handle: SessionHandle) -> Result<()>;

    /// Begin producing position fixes
    fn start_fix(&self, handle: SessionHandle) -> Result<()>;

    /// Stop producing position fixes
    fn stop_fix(&self, handle: SessionHandle) -> Result<()>;

    /// Issue a discriminated control request and wait up to `timeout`
    /// for the engine to acknowledge it
    fn control(&self, handle: SessionHandle, request: ControlRequest, timeout: Duration)
        -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_mask_combines() {
        let mask = EventMask::POSITION | EventMask::NMEA;
        assert!(mask.contains(EventMask::POSITION));
        assert!(mask.contains(EventMask::NMEA));
        assert!(!mask.contains(EventMask::STATUS));
    }

    #[test]
    fn event_mask_all_covers_each_kind() {
        for kind in [
            EventMask::POSITION,
            EventMask::SATELLITE,
            EventMask::STATUS,
            EventMask::NMEA,
            EventMask::ASSIST_DATA_REQUEST,
            EventMask::CONTROL_REPORT,
            EventMask::SERVER_REQUEST,
            EventMask::NI_NOTIFY,
        ] {
            assert!(EventMask::ALL.contains(kind));
        }
    }
}
