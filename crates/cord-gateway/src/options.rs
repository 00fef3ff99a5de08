//! Socket configuration
//!
//! Options for [`Socket::new`](crate::Socket::new). Everything has a
//! sensible default; most applications only supply a token.

use std::sync::Arc;
use std::time::Duration;

use http::HeaderMap;

use cord_model::{Handshake, HandshakeProperties};

use crate::backoff::{Backoff, ExponentialBackoff};
use crate::debug::{Debugger, NoopDebugger};
use crate::gateway::{GatewayRetriever, HttpGatewayRetriever};
use crate::transport::{Transport, TungsteniteTransport};

/// Client name reported in the handshake properties.
pub const CLIENT_NAME: &str = "Cord 1.0";

/// Default read/write/dial deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a [`Socket`](crate::Socket).
pub struct SocketOptions {
    /// Handshake packet template. `token`, `compress` and the host
    /// `properties` are filled automatically.
    pub handshake: Handshake,

    /// How long to wait on reads, writes and dials before considering the
    /// server dead.
    pub timeout: Duration,

    /// How long to wait between reconnections.
    pub backoff: Option<Box<dyn Backoff>>,

    /// The retriever used to look up the gateway URL on each restart.
    pub gateway: Option<Arc<dyn GatewayRetriever>>,

    /// The dialler used to open WebSocket connections.
    pub transport: Option<Arc<dyn Transport>>,

    /// Observer for traffic, connection attempts and errors.
    pub debugger: Option<Arc<dyn Debugger>>,

    /// Extra HTTP headers sent with the WebSocket upgrade.
    pub headers: HeaderMap,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            handshake: Handshake::default(),
            timeout: DEFAULT_TIMEOUT,
            backoff: None,
            gateway: None,
            transport: None,
            debugger: None,
            headers: HeaderMap::new(),
        }
    }
}

impl SocketOptions {
    /// Set the handshake template.
    #[must_use]
    pub fn with_handshake(mut self, handshake: Handshake) -> Self {
        self.handshake = handshake;
        self
    }

    /// Set the read/write/dial deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the reconnection backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Some(Box::new(backoff));
        self
    }

    /// Set the gateway URL retriever.
    #[must_use]
    pub fn with_gateway(mut self, gateway: Arc<dyn GatewayRetriever>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the WebSocket dialler.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the traffic debugger.
    #[must_use]
    pub fn with_debugger(mut self, debugger: Arc<dyn Debugger>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    /// Set extra headers for the WebSocket upgrade request.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Resolve all defaults and stamp the token into the handshake.
    pub(crate) fn fill_defaults(mut self, token: String) -> (EngineOptions, Box<dyn Backoff>) {
        self.handshake.token = token;
        self.handshake.compress = true;
        self.handshake.properties = HandshakeProperties {
            os: std::env::consts::OS.to_string(),
            browser: CLIENT_NAME.to_string(),
            ..HandshakeProperties::default()
        };

        let backoff = self
            .backoff
            .unwrap_or_else(|| Box::new(ExponentialBackoff::default()));

        let engine = EngineOptions {
            handshake: self.handshake,
            timeout: self.timeout,
            gateway: self.gateway.unwrap_or_else(|| {
                Arc::new(HttpGatewayRetriever::new(
                    HttpGatewayRetriever::DEFAULT_BASE_URL,
                    self.timeout,
                ))
            }),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(TungsteniteTransport)),
            debugger: self.debugger.unwrap_or_else(|| Arc::new(NoopDebugger)),
            headers: self.headers,
        };

        (engine, backoff)
    }
}

/// Fully-resolved options the connection engine runs on.
pub(crate) struct EngineOptions {
    pub handshake: Handshake,
    pub timeout: Duration,
    pub gateway: Arc<dyn GatewayRetriever>,
    pub transport: Arc<dyn Transport>,
    pub debugger: Arc<dyn Debugger>,
    pub headers: HeaderMap,
}
