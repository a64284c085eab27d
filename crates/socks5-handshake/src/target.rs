use std::net::{Ipv4Addr, Ipv6Addr};

/// Combines a host and a port into `host:port`.
///
/// A host containing a colon (an IPv6 literal) is wrapped in brackets, as in `[::1]:443`.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

pub(crate) fn ipv4_target(octets: [u8; 4], port: u16) -> String {
    join_host_port(&Ipv4Addr::from(octets).to_string(), port)
}

pub(crate) fn ipv6_target(octets: [u8; 16], port: u16) -> String {
    let ip = Ipv6Addr::from(octets);

    // An IPv4-mapped address names an IPv4 host.
    let host = match ip.to_ipv4_mapped() {
        Some(ipv4) => ipv4.to_string(),
        None => ip.to_string(),
    };

    join_host_port(&host, port)
}

pub(crate) fn domain_target(domain: &[u8], port: u16) -> String {
    join_host_port(&String::from_utf8_lossy(domain), port)
}
