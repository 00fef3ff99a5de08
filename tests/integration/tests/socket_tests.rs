//! Gateway client scenario tests
//!
//! Each test drives the real socket against a scripted in-process
//! WebSocket server, covering the connect, reconnect, resume and failure
//! paths end to end.
//!
//! Run with: cargo test -p integration-tests --test socket_tests

use std::time::Duration;

use integration_tests::{
    close_with_code, expected_identify, expected_resume, hold_open, read_text, send_deflated,
    send_text, MockGateway, READY_PACKET,
};
use tokio::sync::mpsc;

use cord_gateway::{events, GatewayError, OpCode, Socket};
use cord_model::StatusUpdate;

/// Channel-backed READY observer, usable from the sync handler callbacks.
fn ready_probe() -> (
    mpsc::UnboundedSender<String>,
    mpsc::UnboundedReceiver<String>,
) {
    mpsc::unbounded_channel()
}

async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>, what: &str) -> T {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
        .unwrap_or_else(|| panic!("channel closed waiting for {what}"))
}

// ============================================================================
// Connect + READY
// ============================================================================

#[tokio::test]
async fn test_initial_connect_sends_exact_identify() {
    let server = MockGateway::spawn().await;

    server.on_connect(|mut ws| async move {
        let identify = read_text(&mut ws).await;
        assert_eq!(identify, expected_identify("tooken"));
        send_text(&mut ws, READY_PACKET).await;
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());
    let (tx, mut ready) = ready_probe();
    socket.once(events::ready(move |r| {
        tx.send(r.session_id).ok();
    }));

    let session_id = recv_within(&mut ready, "READY").await;
    assert_eq!(session_id, "asdf");

    socket.close().await;
}

// ============================================================================
// Reconnect after a dropped connection
// ============================================================================

#[tokio::test]
async fn test_reconnects_with_resume_after_drop() {
    let server = MockGateway::spawn().await;

    // First connection: identify, READY, then the server drops the link.
    server.on_connect(|mut ws| async move {
        let identify = read_text(&mut ws).await;
        assert!(identify.contains(r#""op":2"#));
        send_text(&mut ws, READY_PACKET).await;
    });

    // Second connection: the client must resume the session from READY,
    // echoing the sequence number it observed.
    server.on_connect(|mut ws| async move {
        let resume = read_text(&mut ws).await;
        assert_eq!(resume, expected_resume("tooken", "asdf", 1));
        send_text(&mut ws, READY_PACKET).await;
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());
    let mut errs = socket.errs();

    let (tx, mut ready) = ready_probe();
    socket.on(events::ready(move |r| {
        tx.send(r.session_id).ok();
    }));

    recv_within(&mut ready, "first READY").await;

    // Dropping the link surfaces a disruption, not a fatal error.
    let err = errs.recv().await.expect("error stream open");
    assert!(!err.is_fatal(), "drop should be a disruption, got {err}");

    recv_within(&mut ready, "second READY").await;
    socket.close().await;
}

// ============================================================================
// InvalidSession recovery
// ============================================================================

#[tokio::test]
async fn test_invalid_session_forces_fresh_identify() {
    let server = MockGateway::spawn().await;

    // First connection establishes a session, then invalidates it.
    server.on_connect(|mut ws| async move {
        let identify = read_text(&mut ws).await;
        assert!(identify.contains(r#""op":2"#));
        send_text(&mut ws, READY_PACKET).await;
        send_text(&mut ws, r#"{"op":9}"#).await;
        hold_open(&mut ws).await;
    });

    // The session id was cleared, so the next handshake must be a fresh
    // Identify rather than a Resume.
    server.on_connect(|mut ws| async move {
        let handshake = read_text(&mut ws).await;
        assert!(
            handshake.contains(r#""op":2"#),
            "expected Identify after invalid session, got {handshake}"
        );
        send_text(&mut ws, READY_PACKET).await;
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());
    let mut errs = socket.errs();

    let (tx, mut ready) = ready_probe();
    socket.on(events::ready(move |r| {
        tx.send(r.session_id).ok();
    }));

    recv_within(&mut ready, "first READY").await;

    let err = errs.recv().await.expect("error stream open");
    assert!(
        matches!(err, GatewayError::InvalidSession),
        "expected InvalidSession, got {err}"
    );

    recv_within(&mut ready, "READY after invalid session").await;
    socket.close().await;
}

// ============================================================================
// Compressed frames
// ============================================================================

#[tokio::test]
async fn test_inflates_zlib_compressed_ready() {
    let server = MockGateway::spawn().await;

    server.on_connect(|mut ws| async move {
        let _identify = read_text(&mut ws).await;
        send_deflated(&mut ws, READY_PACKET).await;
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());
    let (tx, mut ready) = ready_probe();
    socket.once(events::ready(move |r| {
        tx.send(r.session_id).ok();
    }));

    let session_id = recv_within(&mut ready, "compressed READY").await;
    assert_eq!(session_id, "asdf");

    socket.close().await;
}

// ============================================================================
// Fatal close codes
// ============================================================================

#[tokio::test]
async fn test_auth_failure_is_fatal_and_stops_reconnecting() {
    let server = MockGateway::spawn().await;

    server.on_connect(|mut ws| async move {
        let _identify = read_text(&mut ws).await;
        close_with_code(&mut ws, 4004, "Authentication failed").await;
    });

    let socket = Socket::new("tooken", server.socket_options());
    let mut errs = socket.errs();

    let err = errs.recv().await.expect("error stream open");
    assert!(err.is_fatal(), "expected a fatal error, got {err}");
    assert!(matches!(err, GatewayError::Fatal { code: 4004, .. }));

    // Give a would-be reconnect loop time to run; none may appear.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.connections(), 1, "fatal errors must not reconnect");

    // The socket is terminal now.
    let send_result = socket.send(OpCode::StatusUpdate, &StatusUpdate::default()).await;
    assert!(matches!(send_result, Err(GatewayError::Closed)));
}

// ============================================================================
// Server-requested reconnect
// ============================================================================

#[tokio::test]
async fn test_reconnect_op_restarts_with_resume() {
    let server = MockGateway::spawn().await;

    server.on_connect(|mut ws| async move {
        let _identify = read_text(&mut ws).await;
        send_text(&mut ws, READY_PACKET).await;
        send_text(&mut ws, r#"{"op":7}"#).await;
        hold_open(&mut ws).await;
    });

    server.on_connect(|mut ws| async move {
        let resume = read_text(&mut ws).await;
        assert_eq!(resume, expected_resume("tooken", "asdf", 1));
        send_text(&mut ws, READY_PACKET).await;
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());
    let (tx, mut ready) = ready_probe();
    socket.on(events::ready(move |r| {
        tx.send(r.session_id).ok();
    }));

    recv_within(&mut ready, "first READY").await;
    recv_within(&mut ready, "READY after reconnect op").await;

    socket.close().await;
}

// ============================================================================
// Outbound queue
// ============================================================================

#[tokio::test]
async fn test_send_enqueued_before_connect_is_transmitted() {
    let server = MockGateway::spawn().await;
    let (frame_tx, mut frames) = mpsc::unbounded_channel::<String>();

    server.on_connect(move |mut ws| async move {
        let _identify = read_text(&mut ws).await;
        send_text(&mut ws, READY_PACKET).await;
        frame_tx.send(read_text(&mut ws).await).ok();
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());

    // Enqueued while the connection is still being established; the send
    // resolves once the write pump flushes it on the live link.
    socket
        .send(OpCode::StatusUpdate, &StatusUpdate::default())
        .await
        .expect("queued send should be transmitted");

    let frame = recv_within(&mut frames, "queued frame").await;
    assert!(frame.starts_with(r#"{"op":3,"#), "got {frame}");

    socket.close().await;
}

#[tokio::test]
async fn test_heartbeat_carries_observed_sequence() {
    let server = MockGateway::spawn().await;
    let (hb_tx, mut heartbeats) = mpsc::unbounded_channel::<String>();

    server.on_connect(move |mut ws| async move {
        let _identify = read_text(&mut ws).await;
        // A short interval so the test observes a heartbeat immediately.
        send_text(
            &mut ws,
            r#"{"op":0,"t":"READY","s":1,"d":{"session_id":"asdf","heartbeat_interval":25}}"#,
        )
        .await;
        hb_tx.send(read_text(&mut ws).await).ok();
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());

    let heartbeat = recv_within(&mut heartbeats, "heartbeat").await;
    assert_eq!(heartbeat, r#"{"op":1,"d":1,"s":0,"t":""}"#);

    socket.close().await;
}

// ============================================================================
// Close semantics
// ============================================================================

#[tokio::test]
async fn test_send_after_close_fails_without_transmitting() {
    let server = MockGateway::spawn().await;

    server.on_connect(|mut ws| async move {
        let _identify = read_text(&mut ws).await;
        send_text(&mut ws, READY_PACKET).await;
        hold_open(&mut ws).await;
    });

    let socket = Socket::new("tooken", server.socket_options());
    let (tx, mut ready) = ready_probe();
    socket.once(events::ready(move |r| {
        tx.send(r.session_id).ok();
    }));
    recv_within(&mut ready, "READY").await;

    socket.close().await;

    let result = socket.send(OpCode::StatusUpdate, &StatusUpdate::default()).await;
    assert!(matches!(result, Err(GatewayError::Closed)));
}
