//! Integration tests: a fake reader on localhost drives a real client
//! session through the handshake, tag reporting, keepalive, and
//! connection failure scenarios.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use llrp_core::{
    ConnectionInfo, Frame, LlrpCodec, LlrpError, MessageType, ParameterBuilder, ParameterType,
    ReaderClient, ReaderEvent, ReaderOptions,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;

type Reader = Framed<TcpStream, LlrpCodec>;

// ── Helpers ──────────────────────────────────────────────────────

/// Listener on an OS-assigned port plus the matching connection info.
async fn ephemeral_listener() -> (TcpListener, ConnectionInfo) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let info = ConnectionInfo::new(addr.ip().to_string(), addr.port()).with_logging(true);
    (listener, info)
}

async fn accept(listener: &TcpListener) -> Reader {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("timeout waiting for client")
        .unwrap();
    Framed::new(stream, LlrpCodec)
}

async fn send(reader: &mut Reader, ty: MessageType, body: Bytes) {
    reader.send(Frame::new(ty, 0, body)).await.unwrap();
}

async fn expect(reader: &mut Reader, ty: MessageType) -> Frame {
    let frame = tokio::time::timeout(Duration::from_secs(5), reader.next())
        .await
        .expect("timeout waiting for command")
        .expect("client closed")
        .unwrap();
    assert_eq!(frame.message_type(), Some(ty));
    frame
}

async fn next_event(rx: &mut broadcast::Receiver<ReaderEvent>) -> ReaderEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for event")
        .unwrap()
}

fn reader_event(rospec_event: Option<u8>) -> Bytes {
    let mut b = ParameterBuilder::new();
    b.tlv(ParameterType::ReaderEventNotificationData, |b| {
        b.tlv(ParameterType::UtcTimestamp, |b| {
            b.u64(1_700_000_000_000_000);
        });
        match rospec_event {
            Some(event_type) => {
                b.tlv(ParameterType::RospecEvent, |b| {
                    b.u8(event_type).u32(1).u32(0);
                });
            }
            None => {
                b.tlv(ParameterType::ConnectionAttemptEvent, |b| {
                    b.u16(0);
                });
            }
        }
    });
    b.finish()
}

fn success_status() -> Bytes {
    let mut b = ParameterBuilder::new();
    b.tlv(ParameterType::LlrpStatus, |b| {
        b.u16(0).u16(0);
    });
    b.finish()
}

fn tag_report(epc: [u8; 12], count: u16) -> Bytes {
    let mut b = ParameterBuilder::new();
    b.tlv(ParameterType::TagReportData, |b| {
        b.tv(ParameterType::Epc96, &epc);
        b.tv(ParameterType::AntennaId, &[0, 1]);
        b.tv(ParameterType::TagSeenCount, &count.to_be_bytes());
    });
    b.finish()
}

/// Drive a fresh session up to the running state.
async fn handshake(reader: &mut Reader) {
    send(reader, MessageType::ReaderEventNotification, reader_event(None)).await;
    expect(reader, MessageType::SetReaderConfig).await;

    send(reader, MessageType::SetReaderConfigResponse, success_status()).await;
    expect(reader, MessageType::AddRospec).await;

    send(reader, MessageType::AddRospecResponse, success_status()).await;
    expect(reader, MessageType::EnableRospec).await;

    send(reader, MessageType::EnableRospecResponse, success_status()).await;
    expect(reader, MessageType::StartRospec).await;

    send(reader, MessageType::StartRospecResponse, success_status()).await;
    expect(reader, MessageType::EnableEventsAndReports).await;
}

// ── Session lifecycle ────────────────────────────────────────────

#[tokio::test]
async fn test_handshake_and_tag_report() {
    let (listener, info) = ephemeral_listener().await;
    let client = ReaderClient::new(info);
    let mut events = client.subscribe();
    let handle = client.connect();

    let mut reader = accept(&listener).await;
    handshake(&mut reader).await;

    let epc = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
    send(&mut reader, MessageType::RoAccessReport, tag_report(epc, 2)).await;

    match next_event(&mut events).await {
        ReaderEvent::TagObserved(tag) => {
            assert_eq!(tag.tag_id, "aabbccddeeff001122334455");
            assert_eq!(tag.seen_count, 2);
            assert_eq!(tag.antenna_id, Some(1));
        }
        other => panic!("unexpected event {other:?}"),
    }

    // Report cleared the start guard, so the next event restarts the ROSpec.
    send(&mut reader, MessageType::ReaderEventNotification, reader_event(Some(0))).await;
    expect(&mut reader, MessageType::StartRospec).await;

    handle.close().await;
}

#[tokio::test]
async fn test_cycle_end_restarts_without_duplicates() {
    let (listener, info) = ephemeral_listener().await;
    let client = ReaderClient::new(info);
    let handle = client.connect();

    let mut reader = accept(&listener).await;
    handshake(&mut reader).await;

    // Start already in flight: a start-of-ROSpec event must not trigger another.
    send(&mut reader, MessageType::ReaderEventNotification, reader_event(Some(0))).await;
    // End of ROSpec clears the guard and restarts exactly once.
    send(&mut reader, MessageType::ReaderEventNotification, reader_event(Some(1))).await;
    send(&mut reader, MessageType::Keepalive, Bytes::new()).await;

    expect(&mut reader, MessageType::StartRospec).await;
    expect(&mut reader, MessageType::KeepaliveAck).await;

    handle.close().await;
}

#[tokio::test]
async fn test_keepalive_acknowledged() {
    let (listener, info) = ephemeral_listener().await;
    let client = ReaderClient::new(info);
    let handle = client.connect();

    let mut reader = accept(&listener).await;
    for _ in 0..3 {
        send(&mut reader, MessageType::Keepalive, Bytes::new()).await;
        expect(&mut reader, MessageType::KeepaliveAck).await;
    }

    handle.close().await;
}

#[tokio::test]
async fn test_peer_close_reports_disconnect() {
    let (listener, info) = ephemeral_listener().await;
    let client = ReaderClient::new(info);
    let mut events = client.subscribe();
    let handle = client.connect();

    let reader = accept(&listener).await;
    drop(reader);

    match next_event(&mut events).await {
        ReaderEvent::Disconnected(e) => assert!(matches!(*e, LlrpError::PeerClosed)),
        other => panic!("unexpected event {other:?}"),
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session did not end after peer close");
}

#[tokio::test]
async fn test_close_shuts_socket() {
    let (listener, info) = ephemeral_listener().await;
    let client = ReaderClient::new(info);
    let handle = client.connect();

    let mut reader = accept(&listener).await;
    handle.close().await;

    let next = tokio::time::timeout(Duration::from_secs(5), reader.next())
        .await
        .expect("socket still open");
    assert!(next.is_none());
}

// ── Errors and liveness ──────────────────────────────────────────

#[tokio::test]
async fn test_refused_connection_reports_error() {
    // Bind then drop to get a port with nothing listening.
    let (listener, info) = ephemeral_listener().await;
    drop(listener);

    let client = ReaderClient::new(info);
    let mut events = client.subscribe();
    let _handle = client.connect();

    match next_event(&mut events).await {
        ReaderEvent::Error(e) => assert!(matches!(*e, LlrpError::Connection(_))),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_idle_timeout_keeps_connection_open() {
    let (listener, info) = ephemeral_listener().await;
    let options = ReaderOptions {
        idle_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let client = ReaderClient::with_options(info, options);
    let mut events = client.subscribe();
    let handle = client.connect();

    let mut reader = accept(&listener).await;

    match next_event(&mut events).await {
        ReaderEvent::Timeout(window) => assert_eq!(window, Duration::from_millis(100)),
        other => panic!("unexpected event {other:?}"),
    }

    // Still serviced after the timeout fired.
    send(&mut reader, MessageType::Keepalive, Bytes::new()).await;
    expect(&mut reader, MessageType::KeepaliveAck).await;
    assert!(!handle.is_finished());

    handle.close().await;
}

#[tokio::test]
async fn test_multiple_subscribers() {
    let (listener, info) = ephemeral_listener().await;
    let client = ReaderClient::new(info);
    let mut first = client.subscribe();
    let mut second = client.subscribe();
    let handle = client.connect();

    let mut reader = accept(&listener).await;
    send(&mut reader, MessageType::RoAccessReport, tag_report([0x42; 12], 1)).await;

    for rx in [&mut first, &mut second] {
        assert!(matches!(next_event(rx).await, ReaderEvent::TagObserved(_)));
    }

    handle.close().await;
}
