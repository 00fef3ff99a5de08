//! # cord-gateway
//!
//! A client for the realtime chat gateway: a persistent, full-duplex
//! WebSocket session with automatic identify/resume negotiation,
//! heartbeating, and reconnection that never drops queued sends.
//!
//! ```no_run
//! use cord_gateway::{events, Socket, SocketOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let socket = Socket::new("my token", SocketOptions::default());
//!
//!     socket.on(events::ready(|r| {
//!         println!("connected as session {}", r.session_id);
//!     }));
//!
//!     let mut errs = socket.errs();
//!     while let Ok(err) = errs.recv().await {
//!         eprintln!("gateway error: {err}");
//!     }
//! }
//! ```

pub mod backoff;
pub mod debug;
pub mod events;
pub mod gateway;
pub mod options;
pub mod protocol;
pub mod socket;
pub mod transport;

mod connection;
mod queue;

pub use backoff::{Backoff, ExponentialBackoff};
pub use cord_common::GatewayError;
pub use debug::{Debugger, NoopDebugger, TraceDebugger};
pub use events::{EventHandler, EventRegistry};
pub use gateway::{GatewayRetriever, HttpGatewayRetriever, StaticGateway};
pub use options::SocketOptions;
pub use protocol::{CloseCode, OpCode, Payload};
pub use socket::Socket;
pub use transport::{Link, Transport, TransportError, TungsteniteTransport};
