//! Integration tests for FrameCodec with Tokio streams.
//!
//! These tests run the client and server halves of the codec over an
//! in-memory duplex stream, covering both line-ending conventions, partial
//! writes and framing violations.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio_util::codec::{Framed, FramedRead};
use connect4_core::{Error, Nick};
use connect4_protocol::{ClientCommand, Frame, FrameCodec, MessageKind, ServerMessage};

/// Helper function to create a client/server pair over a duplex stream.
fn create_framed_duplex(
    buffer_size: usize,
) -> (
    Framed<DuplexStream, FrameCodec>,
    Framed<DuplexStream, FrameCodec>,
) {
    let (client, server) = tokio::io::duplex(buffer_size);
    let client_framed = Framed::new(client, FrameCodec::new());
    let server_framed = Framed::new(server, FrameCodec::server());
    (client_framed, server_framed)
}

async fn next_message(framed: &mut Framed<DuplexStream, FrameCodec>) -> ServerMessage {
    let frame = framed.next().await.unwrap().unwrap();
    ServerMessage::try_from(&frame).unwrap()
}

#[tokio::test]
async fn test_handshake_exchange() {
    let (mut client, mut server) = create_framed_duplex(1024);

    let nick = Nick::new("alice").unwrap();
    client.send(ClientCommand::Nick(nick.clone())).await.unwrap();

    let received = server.next().await.unwrap().unwrap();
    assert_eq!(
        ClientCommand::try_from(&received).unwrap(),
        ClientCommand::Nick(nick)
    );

    server
        .send(Frame::new("OK", Vec::<String>::new()))
        .await
        .unwrap();
    assert_eq!(next_message(&mut client).await, ServerMessage::Ok);
}

#[tokio::test]
async fn test_server_burst_after_reconnect() {
    let (mut client, mut server) = create_framed_duplex(4096);

    server.send(Frame::new("OK", Vec::<String>::new())).await.unwrap();
    server.send(Frame::new("GAME_START", ["bob"])).await.unwrap();
    server
        .send(Frame::new("GAME_MSG", ["bob's", "turn"]))
        .await
        .unwrap();
    let mut codes = vec!["0"; 42];
    codes[35] = "1";
    server.send(Frame::new("GAME_RECOVERY", codes)).await.unwrap();

    let kinds = [
        MessageKind::Ok,
        MessageKind::GameStart,
        MessageKind::GameMsg,
        MessageKind::GameRecovery,
    ];
    for kind in kinds {
        assert_eq!(next_message(&mut client).await.kind(), kind);
    }
}

#[tokio::test]
async fn test_partial_writes_reassembled() {
    let (client, mut server) = tokio::io::duplex(64);
    let mut reader = FramedRead::new(client, FrameCodec::new());

    let writer = tokio::spawn(async move {
        for chunk in ["silhavyj00", "17GAME_PLAY bo", "b 2 4\r", "\nsilhavyj0002OK\r\n"] {
            server.write_all(chunk.as_bytes()).await.unwrap();
            tokio::task::yield_now().await;
        }
    });

    let first = reader.next().await.unwrap().unwrap();
    assert_eq!(first.tokens(), vec!["GAME_PLAY", "bob", "2", "4"]);
    let second = reader.next().await.unwrap().unwrap();
    assert_eq!(second.tag(), "OK");

    writer.await.unwrap();
}

#[tokio::test]
async fn test_protocol_id_mismatch_surfaces_as_error() {
    let (client, mut server) = tokio::io::duplex(256);
    let mut reader = FramedRead::new(client, FrameCodec::new());

    server.write_all(b"hello there\r\n").await.unwrap();

    let result = reader.next().await.unwrap();
    assert!(matches!(result, Err(Error::ProtocolIdMismatch { .. })));
}

#[tokio::test]
async fn test_unterminated_line_at_eof() {
    let (client, mut server) = tokio::io::duplex(256);
    let mut reader = FramedRead::new(client, FrameCodec::new());

    server.write_all(b"silhavyj0015RQ_CANCELED bob").await.unwrap();
    drop(server);

    let frame = reader.next().await.unwrap().unwrap();
    assert_eq!(
        ServerMessage::try_from(&frame).unwrap(),
        ServerMessage::RqCanceled(Nick::new("bob").unwrap())
    );
    assert!(reader.next().await.is_none());
}

#[tokio::test]
async fn test_invalid_message_keeps_stream_usable() {
    let (mut client, mut server) = create_framed_duplex(1024);

    server.send(Frame::new("GAME_PLAY", ["bob", "9", "9"])).await.unwrap();
    server.send(Frame::new("OK", Vec::<String>::new())).await.unwrap();

    // Catalog validation happens above the codec; framing stays intact
    let frame = client.next().await.unwrap().unwrap();
    assert!(matches!(
        ServerMessage::try_from(&frame),
        Err(Error::InvalidMessage { .. })
    ));
    assert_eq!(next_message(&mut client).await, ServerMessage::Ok);
}
