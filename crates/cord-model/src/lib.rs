//! # cord-model
//!
//! Domain models for payloads carried over the gateway. The connection
//! engine treats event payloads as opaque bytes; these types exist for the
//! handshake exchange and for applications that want typed event handlers.

mod entities;
mod events;
mod handshake;

pub use entities::{
    Attachment, Channel, Game, Guild, Member, Message, PermissionOverwrite, Presence, ReadState,
    Role, User, VoiceState,
};
pub use events::{PresenceUpdate, Ready, Resumed, TypingStart};
pub use handshake::{Handshake, HandshakeProperties, Resume, StatusUpdate};
