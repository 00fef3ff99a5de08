//! Handshake payloads
//!
//! The payloads a client sends to open or continue a gateway session.
//! Field order matters here: the server-side fixtures compare the exact
//! serialized form, so fields are declared in wire order and never skipped.

use serde::{Deserialize, Serialize};

use crate::entities::Game;

/// Payload for op 2 (Identify), sent on the first connection to the server.
///
/// The socket fills `token`, `compress` and the host `properties`
/// automatically; applications typically only set `large_threshold`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    /// Authentication token.
    pub token: String,
    /// Properties describing the connecting device.
    pub properties: HandshakeProperties,
    /// Whether the server may send zlib-compressed frames.
    pub compress: bool,
    /// Guild-size threshold above which offline members are omitted.
    pub large_threshold: u32,
}

/// Device properties contained within the handshake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandshakeProperties {
    /// Operating system of the connecting host.
    #[serde(rename = "$os")]
    pub os: String,
    /// Client name.
    #[serde(rename = "$browser")]
    pub browser: String,
    /// Device name.
    #[serde(rename = "$device")]
    pub device: String,
    #[serde(rename = "$referer")]
    pub referer: String,
    #[serde(rename = "$referring_domain")]
    pub referring_domain: String,
}

/// Payload for op 6 (Resume), sent to continue an existing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    /// Authentication token.
    pub token: String,
    /// Session to continue.
    pub session_id: String,
    /// Last sequence number observed on the previous link.
    #[serde(rename = "seq")]
    pub sequence: u64,
}

/// Payload for op 3 (StatusUpdate), announcing idle/game state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Unix time (ms) the client went idle, or `None` if active.
    pub idle_since: Option<u64>,
    /// Currently played game, if any.
    pub game: Option<Game>,
}
