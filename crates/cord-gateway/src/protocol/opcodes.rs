//! Gateway operation codes
//!
//! Defines all WebSocket gateway op codes per the protocol.

use serde::{Serialize, Serializer};

/// Gateway operation codes
///
/// Op codes define the type of message being sent or received over the
/// WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Server dispatches an event to the client
    Dispatch = 0,
    /// Heartbeat carrying the last-seen sequence number (client/server)
    Heartbeat = 1,
    /// Identify - open a new session (client only)
    Identify = 2,
    /// Status Update - announce idle/game state (client only)
    StatusUpdate = 3,
    /// Voice Status Update - join/move/leave voice channels (client only)
    VoiceStatusUpdate = 4,
    /// Voice Server Ping (client only)
    VoiceServerPing = 5,
    /// Resume - continue a dropped session (client only)
    Resume = 6,
    /// Reconnect - server requests the client restart (server only)
    Reconnect = 7,
    /// Request Members - request guild member chunks (client only)
    RequestMembers = 8,
    /// Invalid Session - the session id is no longer valid (server only)
    InvalidSession = 9,
}

impl OpCode {
    /// Create an `OpCode` from a raw integer value
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::StatusUpdate),
            4 => Some(Self::VoiceStatusUpdate),
            5 => Some(Self::VoiceServerPing),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            8 => Some(Self::RequestMembers),
            9 => Some(Self::InvalidSession),
            _ => None,
        }
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this op opens or continues a session.
    ///
    /// Handshake messages jump to the head of the outbound queue so they
    /// are always the first frame written on a fresh link.
    #[must_use]
    pub const fn is_handshake(self) -> bool {
        matches!(self, Self::Identify | Self::Resume)
    }

    /// Get the name of this op code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "Dispatch",
            Self::Heartbeat => "Heartbeat",
            Self::Identify => "Identify",
            Self::StatusUpdate => "StatusUpdate",
            Self::VoiceStatusUpdate => "VoiceStatusUpdate",
            Self::VoiceServerPing => "VoiceServerPing",
            Self::Resume => "Resume",
            Self::Reconnect => "Reconnect",
            Self::RequestMembers => "RequestMembers",
            Self::InvalidSession => "InvalidSession",
        }
    }
}

impl Serialize for OpCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}
