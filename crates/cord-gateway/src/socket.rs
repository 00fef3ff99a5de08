//! Public socket surface
//!
//! The [`Socket`] represents a connection to the chat gateway. All
//! methods are safe for concurrent use; cloning a socket yields another
//! handle to the same connection.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use cord_common::GatewayError;

use crate::connection::SocketInner;
use crate::events::EventHandler;
use crate::options::SocketOptions;
use crate::protocol::{OpCode, Payload};
use crate::queue::QueuedMessage;

/// A connection to the chat gateway.
///
/// Construction spawns the connection loop; the socket then identifies,
/// heartbeats and reconnects on its own until [`close`](Self::close) is
/// called or a fatal error is observed.
#[derive(Clone)]
pub struct Socket {
    inner: Arc<SocketInner>,
}

impl Socket {
    /// Create a connection to the gateway. `options` may be left at
    /// [`SocketOptions::default`] to use the defaults.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(token: impl Into<String>, options: SocketOptions) -> Self {
        let inner = SocketInner::new(token.into(), options);
        inner.start();
        Self { inner }
    }

    /// Dispatch an event down the gateway socket.
    ///
    /// The call resolves once the message is accepted by the wire or the
    /// socket closes. A restart between enqueue and transmission does not
    /// lose the message; the new connection inherits it.
    pub async fn send<T>(&self, op: OpCode, data: &T) -> Result<(), GatewayError>
    where
        T: Serialize + ?Sized,
    {
        let payload =
            Payload::new(op, data).map_err(|err| GatewayError::Encode(err.to_string()))?;
        let text = payload
            .to_json()
            .map_err(|err| GatewayError::Encode(err.to_string()))?;

        let Some(cell) = self.inner.conn.load() else {
            return Err(GatewayError::Closed);
        };

        let (message, outcome) = QueuedMessage::new(op, text);
        cell.queue.push(message);

        match outcome.await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Closed),
        }
    }

    /// Attach a handler that is called every time its event is received.
    pub fn on(&self, handler: Arc<dyn EventHandler>) {
        self.inner.events.on(handler);
    }

    /// Attach a handler that is called once, the next time its event is
    /// received.
    pub fn once(&self, handler: Arc<dyn EventHandler>) {
        self.inner.events.once(handler);
    }

    /// Detach a previously-attached handler. Detaching is by identity:
    /// pass the same `Arc` that was attached.
    pub fn off(&self, handler: &Arc<dyn EventHandler>) {
        self.inner.events.off(handler);
    }

    /// Subscribe to errors occurring asynchronously on the socket.
    ///
    /// Each call returns an independent receiver observing errors from
    /// subscription time onward. Slow receivers see
    /// [`broadcast::error::RecvError::Lagged`] rather than stalling the
    /// connection.
    #[must_use]
    pub fn errs(&self) -> broadcast::Receiver<GatewayError> {
        self.inner.errs.subscribe()
    }

    /// Free resources associated with the socket.
    ///
    /// Pending [`send`](Self::send) calls resolve with
    /// [`GatewayError::Closed`], and any send after this returns the same.
    /// Idempotent.
    pub async fn close(&self) {
        self.inner.terminate().await;
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("closed", &self.inner.conn.load().is_none())
            .finish()
    }
}
