use std::io;

use crate::proto::ReplyCode;

/// Reasons the handshake can stop.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The underlying stream failed (including a peer closing early).
    #[error("socks5 handshake I/O failure")]
    Io(#[from] io::Error),

    #[error("invalid request version: {0:#04x}")]
    InvalidVersion(u8),

    #[error("invalid reserved byte: {0:#04x}")]
    InvalidReservedByte(u8),

    #[error("address type not supported: {0:#04x}")]
    AddressTypeNotSupported(u8),

    #[error("command not supported: {0:#04x}")]
    CommandNotSupported(u8),
}

impl HandshakeError {
    /// Reply code that was written to the peer before this error was returned, if any.
    pub fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            HandshakeError::AddressTypeNotSupported(_) => Some(ReplyCode::AddressTypeNotSupported),
            HandshakeError::CommandNotSupported(_) => Some(ReplyCode::CommandNotSupported),
            HandshakeError::Io(_) | HandshakeError::InvalidVersion(_) | HandshakeError::InvalidReservedByte(_) => None,
        }
    }
}

impl From<HandshakeError> for io::Error {
    fn from(e: HandshakeError) -> io::Error {
        match e {
            HandshakeError::Io(e) => e,
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
