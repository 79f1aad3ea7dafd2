//! Validation of the remote endpoint address.
//!
//! The remote backend is meant for a model server on the local network, so
//! addresses are restricted to private IPv4 ranges and loopback.

use anyhow::{Result, bail};
use std::net::Ipv4Addr;

/// Checks that `input` is `ip:port` with a private or loopback IPv4 host.
///
/// Accepted hosts: `10.0.0.0/8`, `172.16.0.0/12`, `192.168.0.0/16` and
/// `127.0.0.1`. The port must fit in 0..=65535.
pub fn validate_local_address(input: &str) -> Result<()> {
    let parts: Vec<&str> = input.split(':').collect();
    let [host, port] = parts.as_slice() else {
        bail!(
            "Invalid address: '{input}'\n\n\
             Expected the form <ip>:<port>, e.g. 192.168.1.10:1234"
        );
    };

    let Ok(ip) = host.parse::<Ipv4Addr>() else {
        bail!("Invalid address: '{host}' is not an IPv4 address");
    };

    if !(ip.is_private() || ip == Ipv4Addr::LOCALHOST) {
        bail!(
            "Invalid address: '{ip}' is not a local network address\n\n\
             Use a private address (10.x.x.x, 172.16-31.x.x, 192.168.x.x) or 127.0.0.1"
        );
    }

    if port.parse::<u16>().is_err() {
        bail!("Invalid address: port '{port}' must be a number between 0 and 65535");
    }

    Ok(())
}
