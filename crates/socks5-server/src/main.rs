#![allow(clippy::print_stdout)]

use std::env;

use anyhow::Context as _;
use socks5_handshake::{handshake, HandshakeError};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, info_span, warn, Instrument as _};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "[--port <PORT>] [--bind <ADDR>] [--log-filter <DIRECTIVES>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let args: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
    let args = parse_args(&args)?;

    if args.show_usage {
        let prgm_name = env::args()
            .next()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());
        println!("Usage: {prgm_name} {USAGE}");
        return Ok(());
    }

    init_logging(args.log_filter)?;

    debug!(?args, "Parsed arguments");

    let listener = TcpListener::bind((args.bind, args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.bind, args.port))?;
    info!(addr = %listener.local_addr()?, "Listening for SOCKS5 streams");

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                warn!(%error, "Failed to accept connection");
                continue;
            }
        };

        tokio::spawn(
            async move {
                debug!("Received stream");
                match process_socket(socket).await {
                    Ok(()) => debug!("Stream processed successfully"),
                    Err(error) => warn!("Stream processing failed: {error:#}"),
                }
            }
            .instrument(info_span!("socks5", peer = %addr)),
        );
    }
}

fn init_logging(fallback_filter: &str) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(fallback_filter).context("invalid log filter")?,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct Args<'a> {
    port: u16,
    bind: &'a str,
    log_filter: &'a str,
    show_usage: bool,
}

impl Default for Args<'_> {
    fn default() -> Self {
        Self {
            port: 1080,
            bind: "0.0.0.0",
            log_filter: "info",
            show_usage: false,
        }
    }
}

fn parse_args<'a>(mut input: &[&'a str]) -> anyhow::Result<Args<'a>> {
    let mut args = Args::default();

    loop {
        match input {
            ["--port" | "-p", value, rest @ ..] => {
                args.port = value.parse().context("port value malformed")?;
                input = rest;
            }
            ["--bind" | "-b", value, rest @ ..] => {
                args.bind = value;
                input = rest;
            }
            ["--log-filter", value, rest @ ..] => {
                args.log_filter = value;
                input = rest;
            }
            ["--help" | "-h", rest @ ..] => {
                args.show_usage = true;
                input = rest;
            }
            [unexpected_arg, ..] => anyhow::bail!("unexpected argument: {unexpected_arg}"),
            [] => break,
        }
    }

    Ok(args)
}

async fn process_socket(mut incoming: TcpStream) -> anyhow::Result<()> {
    let target = match handshake(&mut incoming).await {
        Ok(target) => target,
        Err(HandshakeError::Io(error)) => return Err(anyhow::Error::new(error).context("SOCKS5 handshake")),
        Err(error) => {
            match error.reply_code() {
                Some(code) => debug!(%error, reply = %code, "SOCKS5 request rejected"),
                None => debug!(%error, "SOCKS5 request dropped without reply"),
            }
            return Ok(());
        }
    };

    info!(%target, "Requested proxying");

    // The success reply is already out, a failure here can only be reported by closing.
    let mut target_stream = TcpStream::connect(target.as_str())
        .await
        .with_context(|| format!("failed to connect to {target}"))?;

    debug!(target_addr = %target_stream.peer_addr()?, "Connected to target, relaying");

    let (to_target, to_client) = tokio::io::copy_bidirectional(&mut incoming, &mut target_stream)
        .await
        .context("relay")?;

    info!(%target, to_target, to_client, "Relay ended");

    Ok(())
}
