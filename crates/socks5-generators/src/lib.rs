//! proptest strategies producing SOCKS5 handshake inputs.

use std::net::{Ipv4Addr, Ipv6Addr};

use proptest::array::{uniform4, uniform8};
use proptest::collection::vec;
use proptest::prelude::*;

pub fn port() -> impl Strategy<Value = u16> {
    any::<u16>()
}

pub fn ipv4_addr() -> impl Strategy<Value = Ipv4Addr> {
    uniform4(any::<u8>()).prop_map(Ipv4Addr::from)
}

pub fn ipv6_addr() -> impl Strategy<Value = Ipv6Addr> {
    uniform8(any::<u16>()).prop_map(Ipv6Addr::from)
}

pub fn domain() -> impl Strategy<Value = String> {
    "[a-z]{1,10}\\.[a-z]{1,5}"
}

/// Authentication method identifiers as offered in a client greeting (0 to 255 of them).
pub fn method_list() -> impl Strategy<Value = Vec<u8>> {
    vec(any::<u8>(), 0..=255)
}

/// Destination of a SOCKS5 request together with its encoding.
#[derive(Debug, Clone)]
pub enum Destination {
    Ipv4(Ipv4Addr, u16),
    Ipv6(Ipv6Addr, u16),
    Domain(String, u16),
}

impl Destination {
    /// ATYP, DST.ADDR and DST.PORT as sent on the wire.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            Destination::Ipv4(ip, port) => {
                buf.push(0x01);
                buf.extend_from_slice(&ip.octets());
                buf.extend_from_slice(&port.to_be_bytes());
            }
            Destination::Ipv6(ip, port) => {
                buf.push(0x04);
                buf.extend_from_slice(&ip.octets());
                buf.extend_from_slice(&port.to_be_bytes());
            }
            Destination::Domain(domain, port) => {
                let len = u8::try_from(domain.len()).expect("generated domains are shorter than 256 bytes");
                buf.push(0x03);
                buf.push(len);
                buf.extend_from_slice(domain.as_bytes());
                buf.extend_from_slice(&port.to_be_bytes());
            }
        }

        buf
    }

    /// The `host:port` a server is expected to resolve this destination to.
    pub fn expected_target(&self) -> String {
        match self {
            Destination::Ipv4(ip, port) => format!("{ip}:{port}"),
            Destination::Ipv6(ip, port) => match ip.to_ipv4_mapped() {
                Some(ip) => format!("{ip}:{port}"),
                None => format!("[{ip}]:{port}"),
            },
            Destination::Domain(domain, port) => format!("{domain}:{port}"),
        }
    }
}

pub fn destination() -> impl Strategy<Value = Destination> {
    prop_oneof![
        (ipv4_addr(), port()).prop_map(|(ip, port)| Destination::Ipv4(ip, port)),
        (ipv6_addr(), port()).prop_map(|(ip, port)| Destination::Ipv6(ip, port)),
        (domain(), port()).prop_map(|(domain, port)| Destination::Domain(domain, port)),
    ]
}

/// Full request frame: VER, CMD, RSV followed by the encoded destination.
pub fn request_frame(cmd: u8, dest: &Destination) -> Vec<u8> {
    let mut frame = vec![0x05, cmd, 0x00];
    frame.extend(dest.encode());
    frame
}
