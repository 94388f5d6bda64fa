// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! URL and network helpers shared by providers and stages.

use ipnetwork::IpNetwork;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid CIDR {0:?}")]
pub struct InvalidCidr(pub String);

/// Probe URLs for a host:port pair.
///
/// Port 80 is plain HTTP, 443 is HTTPS; any other port gets both schemes
/// with the port spelled out, since either may answer.
pub fn host_port_urls(host: &str, port: u16) -> Vec<String> {
    match port {
        80 => vec![format!("http://{}", host)],
        443 => vec![format!("https://{}", host)],
        _ => vec![
            format!("http://{}:{}", host, port),
            format!("https://{}:{}", host, port),
        ],
    }
}

/// Best-effort hostname extraction from a URL string, without a full URL
/// parser: strips the scheme, then cuts at the first `/`, `?`, `#`, `@`
/// (credentials), or `:` (port).
pub fn extract_hostname(url: &str) -> String {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let rest = rest.split(['/', '?', '#']).next().unwrap_or("");
    let rest = rest.rsplit('@').next().unwrap_or("");
    // IPv6 literals keep their brackets intact
    if let Some(stripped) = rest.strip_prefix('[') {
        if let Some(end) = stripped.find(']') {
            return stripped[..end].to_string();
        }
    }
    rest.split(':').next().unwrap_or("").to_ascii_lowercase()
}

/// Iterator over the host addresses of a CIDR block.
///
/// Mirrors the usual hosts() semantics: the network and broadcast
/// addresses of IPv4 networks smaller than /31 are excluded. Networks
/// with no host addresses (/32, /128) yield the network address itself,
/// so a single-address block still produces one scan input.
pub struct CidrHosts {
    network: IpNetwork,
    inner: Box<dyn Iterator<Item = IpAddr> + Send>,
    yielded: bool,
    done: bool,
}

impl Iterator for CidrHosts {
    type Item = IpAddr;

    fn next(&mut self) -> Option<IpAddr> {
        if self.done {
            return None;
        }
        while let Some(addr) = self.inner.next() {
            if self.is_excluded(addr) {
                continue;
            }
            self.yielded = true;
            return Some(addr);
        }
        self.done = true;
        if !self.yielded {
            return Some(self.network.network());
        }
        None
    }
}

impl CidrHosts {
    fn is_excluded(&self, addr: IpAddr) -> bool {
        match self.network {
            IpNetwork::V4(net) if net.prefix() <= 30 => {
                addr == IpAddr::V4(net.network()) || addr == IpAddr::V4(net.broadcast())
            }
            _ => false,
        }
    }
}

/// Parse a CIDR string and return its host-address iterator.
pub fn expand_cidr(cidr: &str) -> Result<CidrHosts, InvalidCidr> {
    let network: IpNetwork = cidr
        .trim()
        .parse()
        .map_err(|_| InvalidCidr(cidr.to_string()))?;
    Ok(CidrHosts {
        network,
        inner: Box::new(network.iter()),
        yielded: false,
        done: false,
    })
}

#[cfg(test)]
#[path = "net_tests.rs"]
mod tests;
