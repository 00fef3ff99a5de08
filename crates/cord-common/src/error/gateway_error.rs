//! Gateway error type
//!
//! Unified error type for everything that can go wrong on the socket.

/// Errors surfaced on the socket's error stream.
///
/// The type is `Clone` so it can travel through a broadcast channel to any
/// number of subscribers; underlying causes are therefore captured as
/// strings rather than boxed sources.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The gateway URL lookup failed.
    #[error("gateway lookup failed: {0}")]
    GatewayLookup(String),

    /// The WebSocket dial failed.
    #[error("websocket dial failed: {0}")]
    Dial(String),

    /// A read on the transport failed or the connection dropped.
    #[error("websocket read failed: {0}")]
    Read(String),

    /// A write on the transport failed or timed out.
    #[error("websocket write failed: {0}")]
    Write(String),

    /// An outbound payload could not be serialized.
    #[error("failed to encode payload: {0}")]
    Encode(String),

    /// An inbound frame could not be inflated or parsed.
    #[error("error unpacking payload: {0}")]
    Decode(String),

    /// The server sent an op code outside the enumerated set.
    #[error("unhandled op code {0}")]
    UnhandledOp(u8),

    /// The identify/resume exchange did not produce the expected reply.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The server invalidated the session; a fresh Identify follows.
    #[error("invalid session detected")]
    InvalidSession,

    /// A registered handler returned an error during event fan-out.
    #[error("error dispatching {event}: {reason}")]
    Dispatch {
        /// Name of the event being dispatched.
        event: String,
        /// The handler's failure, stringified.
        reason: String,
    },

    /// The server closed the connection with a non-recoverable close code.
    ///
    /// The socket does not reconnect after a fatal error.
    #[error("fatal gateway error (close code {code}): {reason}")]
    Fatal {
        /// WebSocket close code, e.g. 4004 for authentication failure.
        code: u16,
        /// Reason text from the close frame.
        reason: String,
    },

    /// The socket has been closed; no further sends are possible.
    #[error("socket closed")]
    Closed,
}

impl GatewayError {
    /// Whether this error terminates the socket instead of triggering the
    /// reconnect protocol.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }

    /// Whether this error is a transient disruption that the reconnect
    /// protocol recovers from.
    #[must_use]
    pub fn is_disruption(&self) -> bool {
        matches!(
            self,
            Self::GatewayLookup(_)
                | Self::Dial(_)
                | Self::Read(_)
                | Self::Write(_)
                | Self::InvalidSession
        )
    }

    /// Short machine-readable code for this error kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::GatewayLookup(_) => "GATEWAY_LOOKUP",
            Self::Dial(_) => "DIAL",
            Self::Read(_) => "READ",
            Self::Write(_) => "WRITE",
            Self::Encode(_) => "ENCODE",
            Self::Decode(_) => "DECODE",
            Self::UnhandledOp(_) => "UNHANDLED_OP",
            Self::Handshake(_) => "HANDSHAKE",
            Self::InvalidSession => "INVALID_SESSION",
            Self::Dispatch { .. } => "DISPATCH",
            Self::Fatal { .. } => "FATAL",
            Self::Closed => "CLOSED",
        }
    }
}
