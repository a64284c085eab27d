use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::HandshakeError;
use crate::proto::{
    reply_frame, Command, ReplyCode, ATYP_DOMAIN, ATYP_IPV4, ATYP_IPV6, NO_ACCEPTABLE_METHODS, NO_AUTH_REQUIRED,
    RESERVED, SOCKS_VERSION,
};
use crate::target::{domain_target, ipv4_target, ipv6_target};
use crate::ReadWriteStream;

/// Performs the server side of a SOCKS5 handshake and returns the requested `host:port`.
///
/// One method negotiation round is followed by one request round. Only the "no authentication
/// required" method is ever selected and only CONNECT requests succeed.
///
/// On success, a success reply has been written and nothing past the request was read from
/// `stream`, so the caller can start relaying right away.
///
/// On failure:
/// - an invalid request version or reserved byte is reported without writing a reply;
/// - an unsupported address type or command is reported after writing the matching reply;
/// - an I/O error is reported as is, nothing else is written after it.
///
/// Address type is checked before the command, so an unknown address type is reported
/// even for a BIND or UDP ASSOCIATE request.
pub async fn handshake<S>(stream: &mut S) -> Result<String, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    handshake_impl(stream).await
}

async fn handshake_impl(stream: &mut dyn ReadWriteStream) -> Result<String, HandshakeError> {
    let negotiation_request = NegotiationRequest::read(stream).await?;

    let method = negotiation_request.selected_method();
    debug!(
        version = negotiation_request.version,
        offered = ?negotiation_request.methods,
        selected = method,
        "Method negotiation"
    );

    NegotiationResponse::new(method).write(stream).await?;

    // A rejected negotiation does not end the exchange here: a peer that keeps going
    // is turned down by the request round.
    let header = RequestHeader::read(stream).await?;
    trace!(
        version = header.version,
        cmd = header.cmd,
        rsv = header.rsv,
        atyp = header.atyp,
        "Request header"
    );

    if header.version != SOCKS_VERSION {
        debug!(version = header.version, "Invalid request version");
        return Err(HandshakeError::InvalidVersion(header.version));
    }

    if header.rsv != RESERVED {
        debug!(rsv = header.rsv, "Invalid reserved byte");
        return Err(HandshakeError::InvalidReservedByte(header.rsv));
    }

    let Some(target) = read_target(stream, header.atyp).await? else {
        debug!(atyp = header.atyp, "Address type not supported");
        write_reply(stream, ReplyCode::AddressTypeNotSupported).await?;
        return Err(HandshakeError::AddressTypeNotSupported(header.atyp));
    };

    match Command::from_u8(header.cmd) {
        Some(Command::Connect) => {
            write_reply(stream, ReplyCode::Succeeded).await?;
            debug!(%target, "CONNECT request accepted");
            Ok(target)
        }
        command => {
            match command {
                Some(command) => debug!(%command, %target, "Command not supported"),
                None => debug!(cmd = header.cmd, %target, "Unknown command"),
            }
            write_reply(stream, ReplyCode::CommandNotSupported).await?;
            Err(HandshakeError::CommandNotSupported(header.cmd))
        }
    }
}

async fn write_reply(stream: &mut dyn ReadWriteStream, code: ReplyCode) -> Result<(), HandshakeError> {
    stream.write_all(&reply_frame(code)).await?;
    stream.flush().await?;
    Ok(())
}

/// Reads DST.ADDR and DST.PORT for the given address type.
///
/// Returns `None` without reading anything when the address type is unknown.
async fn read_target(stream: &mut dyn ReadWriteStream, atyp: u8) -> Result<Option<String>, HandshakeError> {
    let target = match atyp {
        ATYP_IPV4 => {
            let mut ip = [0; 4];
            stream.read_exact(&mut ip).await?;
            let port = stream.read_u16().await?;
            ipv4_target(ip, port)
        }
        ATYP_DOMAIN => {
            let len = stream.read_u8().await?;
            let mut domain = vec![0; usize::from(len)];
            stream.read_exact(&mut domain).await?;
            let port = stream.read_u16().await?;
            domain_target(&domain, port)
        }
        ATYP_IPV6 => {
            let mut ip = [0; 16];
            stream.read_exact(&mut ip).await?;
            let port = stream.read_u16().await?;
            ipv6_target(ip, port)
        }
        _ => return Ok(None),
    };

    Ok(Some(target))
}

// Negotiation request (client greeting)
// +----+----------+----------+
// |VER | NMETHODS | METHODS  |
// +----+----------+----------+
// | 1  |    1     | 0 to 255 |
// +----+----------+----------+
struct NegotiationRequest {
    version: u8,
    methods: Vec<u8>,
}

impl NegotiationRequest {
    async fn read(stream: &mut dyn ReadWriteStream) -> Result<Self, HandshakeError> {
        let mut fixed_part = [0; 2];
        stream.read_exact(&mut fixed_part).await?;
        let [version, nmethods] = fixed_part;

        let mut methods = vec![0; usize::from(nmethods)];
        stream.read_exact(&mut methods).await?;

        Ok(Self { version, methods })
    }

    fn selected_method(&self) -> u8 {
        if self.version != SOCKS_VERSION || self.methods.is_empty() {
            return NO_ACCEPTABLE_METHODS;
        }

        if self.methods.contains(&NO_AUTH_REQUIRED) {
            NO_AUTH_REQUIRED
        } else {
            NO_ACCEPTABLE_METHODS
        }
    }
}

/// Negotiation response (server choice)
/// +----+--------+
/// |VER | METHOD |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
struct NegotiationResponse {
    method: u8,
}

impl NegotiationResponse {
    fn new(method: u8) -> Self {
        Self { method }
    }

    async fn write(&self, stream: &mut dyn ReadWriteStream) -> Result<(), HandshakeError> {
        stream.write_all(&[SOCKS_VERSION, self.method]).await?;
        stream.flush().await?;
        Ok(())
    }
}

/// Fixed part of the SOCKS request
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
struct RequestHeader {
    version: u8,
    cmd: u8,
    rsv: u8,
    atyp: u8,
}

impl RequestHeader {
    async fn read(stream: &mut dyn ReadWriteStream) -> Result<Self, HandshakeError> {
        let mut buffer = [0; 4];
        stream.read_exact(&mut buffer).await?;
        let [version, cmd, rsv, atyp] = buffer;

        Ok(Self {
            version,
            cmd,
            rsv,
            atyp,
        })
    }
}
