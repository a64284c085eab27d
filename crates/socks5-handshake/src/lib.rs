//! Server side of the SOCKS5 handshake ([RFC 1928]).
//!
//! [`handshake`] drives one method negotiation round followed by one request round over a
//! caller-owned stream and returns the requested destination as a `host:port` string.
//! Only the "no authentication required" method and the CONNECT command are accepted.
//!
//! [RFC 1928]: https://www.ietf.org/rfc/rfc1928.txt

mod error;
mod handshake;
mod proto;
mod target;

pub use error::HandshakeError;
pub use handshake::handshake;
pub use proto::{
    reply_frame, Command, ReplyCode, ATYP_DOMAIN, ATYP_IPV4, ATYP_IPV6, NO_ACCEPTABLE_METHODS, NO_AUTH_REQUIRED,
    REPLY_FRAME_LEN, RESERVED, SOCKS_VERSION,
};
pub use target::join_host_port;

use tokio::io::{AsyncRead, AsyncWrite};

/// Super-trait usable as a trait object, so that the handshake body is compiled once
/// instead of once per stream type.
trait ReadWriteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<S> ReadWriteStream for S where S: AsyncRead + AsyncWrite + Unpin + Send {}
