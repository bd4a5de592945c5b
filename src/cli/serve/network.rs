//! LAN address discovery for the "Network" preview URL.

use std::net::{IpAddr, Ipv4Addr};

use sysinfo::Networks;

/// Hostname shown when no LAN address is available.
pub const LOOPBACK_HOST: &str = "localhost";

/// First non-internal IPv4 address among `addrs`.
pub fn first_lan_ipv4<I>(addrs: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_unspecified() && !v4.is_link_local() => {
            Some(v4)
        }
        _ => None,
    })
}

/// Best-effort LAN host for this machine, falling back to `localhost`.
pub fn local_network_host() -> String {
    let networks = Networks::new_with_refreshed_list();

    // Interface order from the OS is not stable; sort by name for a
    // deterministic pick.
    let mut interfaces: Vec<_> = networks.list().iter().collect();
    interfaces.sort_by(|a, b| a.0.cmp(b.0));

    let addrs = interfaces
        .into_iter()
        .flat_map(|(_, data)| data.ip_networks().iter().map(|net| net.addr));

    first_lan_ipv4(addrs).map_or_else(|| LOOPBACK_HOST.to_string(), |ip| ip.to_string())
}
