//! Server lifecycle management.

use anyhow::Result;
use std::net::SocketAddr;
use tiny_http::Server;

/// Bind to the given interface and port.
///
/// No port retry: an occupied port is a startup failure.
pub fn bind(interface: std::net::IpAddr, port: u16) -> Result<(Server, SocketAddr)> {
    let requested = SocketAddr::new(interface, port);
    let server = Server::http(requested).map_err(|e| {
        anyhow::anyhow!("Failed to start preview server on {requested}: {e}")
    })?;

    // Port 0 asks the OS for a free port; report the real one.
    let addr = server.server_addr().to_ip().unwrap_or(requested);
    Ok((server, addr))
}
