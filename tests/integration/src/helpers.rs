//! Test helpers for integration tests
//!
//! Provides a scriptable in-process gateway server: each incoming
//! WebSocket connection is handed to the next queued script, mirroring
//! how the production gateway owns one conversation per connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use cord_gateway::backoff::ExponentialBackoff;
use cord_gateway::{SocketOptions, StaticGateway};

/// Server side of an accepted WebSocket connection.
pub type ServerWs = WebSocketStream<TcpStream>;

type ConnectScript = Box<dyn FnOnce(ServerWs) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// The READY packet used across the scenario tests.
pub const READY_PACKET: &str =
    r#"{"op":0,"t":"READY","s":1,"d":{"session_id":"asdf","heartbeat_interval":10000}}"#;

/// A scriptable mock gateway server.
///
/// Scripts queued with [`on_connect`](Self::on_connect) are consumed one
/// per accepted connection, in order; a connection arriving with no
/// queued script waits until one is provided.
pub struct MockGateway {
    url: String,
    scripts: mpsc::UnboundedSender<ConnectScript>,
    connections: Arc<AtomicUsize>,
}

impl MockGateway {
    /// Bind a mock gateway on a random local port and start accepting.
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind mock gateway");
        let addr = listener.local_addr().expect("listener has an address");

        let (scripts, mut pending) = mpsc::unbounded_channel::<ConnectScript>();
        let connections = Arc::new(AtomicUsize::new(0));
        let accepted = connections.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                accepted.fetch_add(1, Ordering::SeqCst);

                let Some(script) = pending.recv().await else {
                    return;
                };
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    continue;
                };
                tokio::spawn(script(ws));
            }
        });

        Self {
            url: format!("ws://{addr}"),
            scripts,
            connections,
        }
    }

    /// The `ws://` URL clients should dial.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// How many TCP connections the server has accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Queue a script for the next accepted connection.
    pub fn on_connect<F, Fut>(&self, script: F)
    where
        F: FnOnce(ServerWs) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.scripts
            .send(Box::new(move |ws| Box::pin(script(ws))))
            .expect("accept loop alive");
    }

    /// Socket options wired to this server, with a near-zero backoff so
    /// reconnection scenarios finish quickly.
    pub fn socket_options(&self) -> SocketOptions {
        SocketOptions::default()
            .with_gateway(StaticGateway::new(self.url()))
            .with_timeout(Duration::from_secs(5))
            .with_backoff(ExponentialBackoff::new(
                Duration::from_millis(1),
                Duration::from_millis(5),
                2.0,
                0.0,
            ))
    }
}

/// Read the next text frame, skipping control frames.
///
/// # Panics
/// Panics if the connection yields anything other than a text frame.
pub async fn read_text(ws: &mut ServerWs) -> String {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return text.as_str().to_string(),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

/// Send a text frame.
pub async fn send_text(ws: &mut ServerWs, text: &str) {
    ws.send(Message::Text(text.into()))
        .await
        .expect("send text frame");
}

/// Send a binary frame carrying `text` zlib-compressed.
pub async fn send_deflated(ws: &mut ServerWs, text: &str) {
    use std::io::Write;

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(text.as_bytes()).expect("compress");
    let compressed = encoder.finish().expect("finish zlib stream");

    ws.send(Message::Binary(compressed.into()))
        .await
        .expect("send binary frame");
}

/// Close the connection with the given close code.
pub async fn close_with_code(ws: &mut ServerWs, code: u16, reason: &str) {
    ws.close(Some(CloseFrame {
        code: CloseCode::from(code),
        reason: reason.into(),
    }))
    .await
    .ok();
}

/// Park the script until the peer goes away, keeping the connection open.
pub async fn hold_open(ws: &mut ServerWs) {
    while let Some(Ok(_)) = ws.next().await {}
}

/// The exact Identify frame the client sends for `token` on this host.
pub fn expected_identify(token: &str) -> String {
    format!(
        concat!(
            r#"{{"op":2,"d":{{"token":"{token}","properties":{{"$os":"{os}","$browser":"Cord 1.0","#,
            r#""$device":"","$referer":"","$referring_domain":""}},"compress":true,"#,
            r#""large_threshold":0}},"s":0,"t":""}}"#
        ),
        token = token,
        os = std::env::consts::OS,
    )
}

/// The exact Resume frame the client sends to continue `session_id`.
pub fn expected_resume(token: &str, session_id: &str, seq: u64) -> String {
    format!(
        r#"{{"op":6,"d":{{"token":"{token}","session_id":"{session_id}","seq":{seq}}},"s":0,"t":""}}"#
    )
}
