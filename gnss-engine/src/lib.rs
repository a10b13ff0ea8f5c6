//! Event-dispatch core for a GNSS location-engine adapter
//!
//! This crate sits between a transport client (the `gnss_api` traits) and
//! the platform consumer. Raw engine events land in a FIFO queue; one
//! deferred worker thread drains it, translates each event into a consumer
//! report, and fires the registered callbacks.
//!
//! ```text
//! transport thread(s)          worker thread            consumer context
//!   EventSink::deliver ──► EventQueue ──► translate ──► GnssCallbacks
//!                                             │
//!                                      EngineState ◄── LocEngine ops
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gnss_engine::{LocEngine, GnssCallbacks};
//!
//! let mut engine = LocEngine::new(client);
//! engine.init(Arc::new(MyCallbacks))?;
//! engine.set_position_mode(gnss_api::PositionMode::Standalone, 1)?;
//! engine.start()?;
//! // ... reports arrive on the registered callbacks ...
//! engine.stop()?;
//! engine.cleanup();
//! ```
//!
//! # Threading
//!
//! Public operations run on the caller's thread and return before any
//! resulting callback fires. All report callbacks come from the single
//! worker thread, in event order. The AGPS data-connection handshake is
//! the one exception: its inform requests, including the settle delay,
//! run on the consumer's own context.

mod agps;
mod callbacks;
mod engine;
mod error;
pub mod logging;
mod queue;
mod report;
mod state;
mod translate;
mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use callbacks::{AgpsCallbacks, AgpsType, GnssCallbacks};
pub use engine::{EngineConfig, LocEngine};
pub use error::{EngineError, Result};
pub use queue::{Dequeued, EventQueue};
pub use report::{EngineStatus, Location, SatelliteStatus, SvRecord, MAX_SVS};
pub use state::AgpsSessionStatus;
pub use translate::{build_sv_status, translate_position, FIX_ASSOCIATION_WINDOW};
