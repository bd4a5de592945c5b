//! `[serve]` section configuration.
//!
//! Contains preview server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "0.0.0.0"   # Network interface (0.0.0.0 = all interfaces)
//! port = 3000             # HTTP port number
//! ```
//!
//! Use `interface = "127.0.0.1"` to keep the preview off the LAN.

use std::net::{IpAddr, Ipv4Addr};

use serde::Deserialize;

/// Preview server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `0.0.0.0` (default): all interfaces (LAN accessible)
    /// - `127.0.0.1`: localhost only
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}
