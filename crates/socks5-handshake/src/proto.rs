pub const SOCKS_VERSION: u8 = 0x05;
pub const RESERVED: u8 = 0x00;

pub const NO_AUTH_REQUIRED: u8 = 0x00;
pub const NO_ACCEPTABLE_METHODS: u8 = 0xFF;

// https://www.ietf.org/rfc/rfc1928.txt
// o  ATYP (1 byte)  address type of following addresses:
//     o  IP V4 address: X'01'
//     o  DOMAINNAME: X'03'
//     o  IP V6 address: X'04'
pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;
pub const ATYP_IPV6: u8 = 0x04;

/// Length of a reply as emitted by this server (IPv4 bound address).
pub const REPLY_FRAME_LEN: usize = 10;

/// SOCKS5 request command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Connect = 0x01,
    Bind = 0x02,
    UdpAssociate = 0x03,
}

impl Command {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Command::Connect),
            0x02 => Some(Command::Bind),
            0x03 => Some(Command::UdpAssociate),
            _ => None,
        }
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Command::Connect => write!(f, "CONNECT"),
            Command::Bind => write!(f, "BIND"),
            Command::UdpAssociate => write!(f, "UDP ASSOCIATE"),
        }
    }
}

/// SOCKS5 reply codes defined in RFC1928.
///
/// The handshake only ever sends `Succeeded`, `CommandNotSupported` and `AddressTypeNotSupported`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    Succeeded = 0x00,
    GeneralSocksServerFailure = 0x01,
    ConnectionNotAllowedByRuleset = 0x02,
    NetworkUnreachable = 0x03,
    HostUnreachable = 0x04,
    ConnectionRefused = 0x05,
    TtlExpired = 0x06,
    CommandNotSupported = 0x07,
    AddressTypeNotSupported = 0x08,
}

impl ReplyCode {
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl core::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReplyCode::Succeeded => write!(f, "succeeded"),
            ReplyCode::GeneralSocksServerFailure => write!(f, "general SOCKS server failure"),
            ReplyCode::ConnectionNotAllowedByRuleset => write!(f, "connection not allowed by ruleset"),
            ReplyCode::NetworkUnreachable => write!(f, "network unreachable"),
            ReplyCode::HostUnreachable => write!(f, "host unreachable"),
            ReplyCode::ConnectionRefused => write!(f, "connection refused"),
            ReplyCode::TtlExpired => write!(f, "TTL expired"),
            ReplyCode::CommandNotSupported => write!(f, "command not supported"),
            ReplyCode::AddressTypeNotSupported => write!(f, "address type not supported"),
        }
    }
}

/// Builds a SOCKS reply carrying `code`.
///
/// The bound address is always reported as `0.0.0.0:0`.
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   |    4     |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn reply_frame(code: ReplyCode) -> [u8; REPLY_FRAME_LEN] {
    [SOCKS_VERSION, code.to_u8(), RESERVED, ATYP_IPV4, 0, 0, 0, 0, 0, 0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_frame_layout() {
        assert_eq!(
            reply_frame(ReplyCode::Succeeded),
            [0x05, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(reply_frame(ReplyCode::CommandNotSupported)[1], 0x07);
        assert_eq!(reply_frame(ReplyCode::AddressTypeNotSupported)[1], 0x08);
    }

    #[test]
    fn reply_code_display() {
        assert_eq!(ReplyCode::Succeeded.to_string(), "succeeded");
        assert_eq!(ReplyCode::CommandNotSupported.to_string(), "command not supported");
        assert_eq!(ReplyCode::AddressTypeNotSupported.to_string(), "address type not supported");
    }

    #[test]
    fn command_from_u8() {
        assert_eq!(Command::from_u8(1), Some(Command::Connect));
        assert_eq!(Command::from_u8(2), Some(Command::Bind));
        assert_eq!(Command::from_u8(3), Some(Command::UdpAssociate));
        assert_eq!(Command::from_u8(0), None);
        assert_eq!(Command::from_u8(4), None);
        assert_eq!(Command::UdpAssociate.to_string(), "UDP ASSOCIATE");
    }
}
