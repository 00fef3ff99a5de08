//! Dispatch event payloads
//!
//! Typed forms of the payloads carried in dispatch frames.

use serde::{Deserialize, Serialize};

use crate::entities::{Channel, Game, Guild, ReadState, User};

/// Payload of the `READY` event, received after a successful Identify.
///
/// `session_id` and `heartbeat_interval` drive the connection engine; the
/// remaining fields are initial state for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ready {
    #[serde(rename = "v", default)]
    pub version: u32,
    pub session_id: String,
    /// Interval between client heartbeats, in milliseconds.
    pub heartbeat_interval: u64,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub read_state: Vec<ReadState>,
    #[serde(default)]
    pub private_channels: Vec<Channel>,
    #[serde(default)]
    pub guilds: Vec<Guild>,
}

/// Payload of the `RESUMED` event, received after a successful Resume.
///
/// Some server versions omit the heartbeat interval here, in which case the
/// client keeps the one it learned from READY.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resumed {
    #[serde(default)]
    pub heartbeat_interval: Option<u64>,
}

/// Payload of the `TYPING_START` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingStart {
    pub user_id: String,
    pub channel_id: String,
    pub timestamp: u64,
}

/// Payload of the `PRESENCE_UPDATE` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceUpdate {
    pub status: String,
    pub guild_id: String,
    pub roles: Vec<String>,
    pub user: Option<User>,
    pub game: Option<Game>,
}
