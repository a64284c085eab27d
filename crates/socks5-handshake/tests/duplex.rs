//! Drives the handshake over an in-memory duplex pipe, the way a SOCKS5 client would.

use proptest::prelude::*;
use socks5_generators::{self as generators, Destination};
use socks5_handshake::{handshake, reply_frame, HandshakeError, ReplyCode, REPLY_FRAME_LEN};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

async fn read_vec(stream: &mut DuplexStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0; len];
    stream.read_exact(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn connect_then_relay() {
    let (mut client, mut server) = duplex(1024);

    let server_task = tokio::spawn(async move {
        let target = handshake(&mut server).await?;

        // The first relayed bytes must still be in the stream.
        let mut payload = [0; 4];
        server.read_exact(&mut payload).await?;
        assert_eq!(&payload, b"ping");
        server.write_all(b"pong").await?;

        Ok::<_, HandshakeError>(target)
    });

    client.write_all(&[5, 2, 0x02, 0x00]).await.unwrap();
    assert_eq!(read_vec(&mut client, 2).await, [5, 0]);

    // Request and first payload bytes in a single write.
    let mut request = generators::request_frame(1, &Destination::Domain("example.com".to_owned(), 8080));
    request.extend_from_slice(b"ping");
    client.write_all(&request).await.unwrap();

    assert_eq!(read_vec(&mut client, REPLY_FRAME_LEN).await, reply_frame(ReplyCode::Succeeded));
    assert_eq!(read_vec(&mut client, 4).await, b"pong");

    let target = server_task.await.unwrap().unwrap();
    assert_eq!(target, "example.com:8080");
}

#[tokio::test]
async fn rejected_command_gets_a_reply_before_close() {
    let (mut client, mut server) = duplex(1024);

    let server_task = tokio::spawn(async move {
        let result = handshake(&mut server).await;
        drop(server);
        result
    });

    client.write_all(&[5, 1, 0x00]).await.unwrap();
    assert_eq!(read_vec(&mut client, 2).await, [5, 0]);

    let request = generators::request_frame(2, &Destination::Ipv4([1, 2, 3, 4].into(), 80));
    client.write_all(&request).await.unwrap();

    let mut reply = Vec::new();
    client.read_to_end(&mut reply).await.unwrap();
    assert_eq!(reply, reply_frame(ReplyCode::CommandNotSupported));

    let err = server_task.await.unwrap().unwrap_err();
    assert!(matches!(err, HandshakeError::CommandNotSupported(2)), "{err:?}");
}

#[tokio::test]
async fn protocol_violation_closes_without_reply() {
    let (mut client, mut server) = duplex(1024);

    let server_task = tokio::spawn(async move {
        let result = handshake(&mut server).await;
        drop(server);
        result
    });

    client.write_all(&[5, 1, 0x00]).await.unwrap();
    assert_eq!(read_vec(&mut client, 2).await, [5, 0]);

    client.write_all(&[5, 1, 0xAA, 1]).await.unwrap();

    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty(), "unexpected bytes: {rest:?}");

    let err = server_task.await.unwrap().unwrap_err();
    assert!(matches!(err, HandshakeError::InvalidReservedByte(0xAA)), "{err:?}");
}

#[tokio::test]
async fn peer_closing_mid_greeting() {
    let (mut client, mut server) = duplex(1024);

    client.write_all(&[5, 3, 0x00]).await.unwrap();
    drop(client);

    let err = handshake(&mut server).await.unwrap_err();
    assert!(
        matches!(&err, HandshakeError::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof),
        "{err:?}"
    );
}

fn run_connect(dest: &Destination) -> String {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let (mut client, mut server) = duplex(1024);

        client.write_all(&[5, 1, 0x00]).await.unwrap();
        client.write_all(&generators::request_frame(1, dest)).await.unwrap();

        let target = handshake(&mut server).await.unwrap();

        assert_eq!(read_vec(&mut client, 2).await, [5, 0]);
        assert_eq!(read_vec(&mut client, REPLY_FRAME_LEN).await, reply_frame(ReplyCode::Succeeded));

        target
    })
}

proptest! {
    #[test]
    fn any_destination_is_resolved(dest in generators::destination()) {
        prop_assert_eq!(run_connect(&dest), dest.expected_target());
    }
}
