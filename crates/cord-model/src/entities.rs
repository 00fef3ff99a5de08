//! Chat service entities
//!
//! Structures shared between several gateway events. Every field carries a
//! serde default so partial payloads from older server versions still parse.

use serde::{Deserialize, Serialize};

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub avatar: String,
    pub discriminator: String,
    pub verified: bool,
    pub bot: bool,
}

/// The "playing ..." game attached to a presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Game {
    pub name: String,
}

/// The online/offline/idle status of a guild member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Presence {
    pub user: Option<User>,
    pub status: String,
    pub game: Option<Game>,
}

/// A guild member role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub managed: bool,
    pub hoist: bool,
    pub color: u32,
    pub position: i32,
    pub permissions: u64,
}

/// Membership of a user within a guild.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub guild_id: String,
    pub joined_at: String,
    pub deaf: bool,
    pub mute: bool,
    pub user: Option<User>,
    pub roles: Vec<String>,
}

/// A permission overwrite attached to a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionOverwrite {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub deny: u64,
    pub allow: u64,
}

/// A text or voice channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Channel {
    pub id: String,
    pub guild_id: String,
    pub name: String,
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub last_message_id: String,
    pub position: i32,
    pub is_private: bool,
    pub recipient: Option<User>,
    pub permission_overwrites: Vec<PermissionOverwrite>,
}

/// The voice state of a guild member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceState {
    pub user_id: String,
    pub session_id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub suppress: bool,
    pub self_mute: bool,
    pub self_deaf: bool,
    pub mute: bool,
    pub deaf: bool,
}

/// A guild, sometimes referred to as a server in clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub region: String,
    pub owner_id: String,
    pub joined_at: String,
    pub large: bool,
    pub roles: Vec<Role>,
    pub members: Vec<Member>,
    pub presences: Vec<Presence>,
    pub channels: Vec<Channel>,
    pub voice_states: Vec<VoiceState>,
    pub unavailable: Option<bool>,
}

/// A message posted to a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub content: String,
    pub timestamp: String,
    pub edited_timestamp: String,
    pub tts: bool,
    pub mention_everyone: bool,
    pub author: Option<User>,
    pub attachments: Vec<Attachment>,
    pub mentions: Vec<User>,
}

/// A file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: String,
    pub url: String,
    pub proxy_url: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub size: u64,
}

/// Read position of a channel, carried in the READY payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadState {
    pub id: String,
    pub mention_count: u32,
    pub last_message_id: String,
}
