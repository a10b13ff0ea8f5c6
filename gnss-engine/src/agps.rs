//! AGPS data-connection handshake and server configuration
//!
//! The engine drives the handshake by emitting server requests; the
//! consumer answers on its own context by reporting the connection
//! outcome. Outcome reports run on the caller's thread, including the
//! configurable settle delay around the inform request.

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::thread;

use gnss_api::{ControlRequest, DataConnOpenStatus, ServerRequest};

use crate::engine::EngineShared;
use crate::error::{EngineError, Result};
use crate::state::AgpsSessionStatus;

/// How the consumer's data-connection attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionOutcome {
    OpenSucceeded,
    OpenFailed,
    Closed,
}

/// Record an engine-initiated connection request; the worker reports the
/// status change to the consumer after this returns
pub(crate) fn handle_server_request(shared: &EngineShared, request: ServerRequest) {
    let mut state = shared.state.lock();
    match request {
        ServerRequest::Open { conn_handle } => {
            tracing::info!(conn_handle, "engine requested data connection");
            state.conn_handle = Some(conn_handle);
            state.agps_status = AgpsSessionStatus::Requested;
        }
        ServerRequest::Close { conn_handle } => {
            tracing::info!(conn_handle, "engine released data connection");
            state.conn_handle = Some(conn_handle);
            state.agps_status = AgpsSessionStatus::Released;
        }
    }
}

/// Inform the engine how the data-connection attempt ended
///
/// The transport needs settle time around this request; the delay length
/// comes from [`EngineConfig`](crate::EngineConfig) and a zero delay skips
/// the sleeps entirely.
pub(crate) fn report_connection_outcome(
    shared: &EngineShared,
    outcome: ConnectionOutcome,
) -> Result<()> {
    let (conn_handle, apn) = {
        let state = shared.state.lock();
        (state.conn_handle, state.apn.clone())
    };
    let conn_handle = conn_handle.unwrap_or_else(|| {
        tracing::warn!("no engine connection request on record, using handle 0");
        0
    });

    let request = match outcome {
        ConnectionOutcome::OpenSucceeded => ControlRequest::InformServerOpen {
            conn_handle,
            status: DataConnOpenStatus::Success { apn },
        },
        ConnectionOutcome::OpenFailed => ControlRequest::InformServerOpen {
            conn_handle,
            status: DataConnOpenStatus::Failure,
        },
        ConnectionOutcome::Closed => ControlRequest::InformServerClose { conn_handle },
    };

    let delay = shared.config.agps_handshake_delay;
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    let result = shared.control(request);
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    result
}

/// Push the configured SUPL server address down to the engine, resolving
/// the hostname on first use and caching the result
pub(crate) fn configure_server(shared: &EngineShared) -> Result<()> {
    let (host, port, cached) = {
        let state = shared.state.lock();
        match (&state.server_host, state.server_port) {
            (Some(host), port) if port != 0 => (host.clone(), port, state.server_addr),
            _ => {
                return Err(EngineError::ResolutionFailed(
                    "no AGPS server configured".to_string(),
                ))
            }
        }
    };

    let addr = match cached {
        Some(addr) => addr,
        None => {
            let addr = resolve_host(&host)?;
            shared.state.lock().server_addr = Some(addr);
            addr
        }
    };

    let url = format!("{addr}:{port}");
    tracing::debug!(%url, "configuring AGPS server");
    shared.control(ControlRequest::SetServerAddress { url })
}

fn resolve_host(host: &str) -> Result<Ipv4Addr> {
    let addrs = (host, 0u16)
        .to_socket_addrs()
        .map_err(|e| EngineError::ResolutionFailed(format!("{host}: {e}")))?;

    for addr in addrs {
        if let SocketAddr::V4(v4) = addr {
            return Ok(*v4.ip());
        }
    }
    Err(EngineError::ResolutionFailed(format!(
        "{host}: no IPv4 address"
    )))
}
