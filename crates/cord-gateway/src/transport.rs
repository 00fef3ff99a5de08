//! WebSocket transport
//!
//! The [`Transport`] and [`Link`] traits abstract the frame-level
//! connection so tests can substitute their own; [`TungsteniteTransport`]
//! is the default implementation over `tokio-tungstenite`.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use http::HeaderMap;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = futures_util::stream::SplitSink<WsStream, Message>;
type WsSource = futures_util::stream::SplitStream<WsStream>;

/// Errors produced by the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The WebSocket upgrade could not be completed.
    #[error("dial failed: {0}")]
    Dial(String),

    /// The peer sent a close frame.
    #[error("connection closed by peer (code {code}): {reason}")]
    Closed {
        /// WebSocket close code from the frame, 1000 if absent.
        code: u16,
        /// Reason text from the frame.
        reason: String,
    },

    /// A frame could not be written.
    #[error("send failed: {0}")]
    Send(String),

    /// A frame could not be read.
    #[error("receive failed: {0}")]
    Recv(String),
}

/// Dials gateway URLs into live [`Link`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a WebSocket connection to `url`, attaching `headers` to the
    /// upgrade request.
    async fn dial(&self, url: &str, headers: &HeaderMap) -> Result<Arc<dyn Link>, TransportError>;
}

/// A single full-duplex frame connection.
///
/// `send_text` and `recv` may be called concurrently from the write and
/// read pumps; implementations must tolerate that.
#[async_trait]
pub trait Link: Send + Sync {
    /// Send a text frame.
    async fn send_text(&self, text: String) -> Result<(), TransportError>;

    /// Receive the next data frame, skipping control frames.
    ///
    /// Returns `Ok(None)` when the stream ends without a close frame, and
    /// [`TransportError::Closed`] when the peer closes explicitly.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Send a close frame and shut the connection down. Idempotent enough
    /// to be called on an already-dead link.
    async fn close(&self) -> Result<(), TransportError>;
}

/// The default dialler, backed by `tokio-tungstenite`.
///
/// TLS and proxying follow the system configuration of the underlying
/// connector.
#[derive(Debug, Default, Clone, Copy)]
pub struct TungsteniteTransport;

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn dial(&self, url: &str, headers: &HeaderMap) -> Result<Arc<dyn Link>, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::Dial(e.to_string()))?;
        for (name, value) in headers {
            request.headers_mut().append(name, value.clone());
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Dial(e.to_string()))?;
        let (writer, reader) = stream.split();

        Ok(Arc::new(WsLink {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        }))
    }
}

/// A live `tokio-tungstenite` connection, split so the read and write
/// pumps never contend on one another.
struct WsLink {
    writer: Mutex<WsSink>,
    reader: Mutex<WsSource>,
}

#[async_trait]
impl Link for WsLink {
    async fn send_text(&self, text: String) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((1000, String::new()));
                    return Err(TransportError::Closed { code, reason });
                }
                // Ping/pong are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Recv(e.to_string())),
                None => return Ok(None),
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}
