//! Event handlers
//!
//! A handler listens for one named event and is invoked with the raw,
//! still-marshalled payload bytes from the socket.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use cord_model::{Message, PresenceUpdate, Ready, Resumed, TypingStart};

/// A type that can be attached to a socket to listen for an event.
pub trait EventHandler: Send + Sync {
    /// Name of the event this handler processes, the `t` key in dispatch
    /// frames.
    fn name(&self) -> &str;

    /// Called with the raw payload bytes from the socket. May return an
    /// error if unmarshalling fails; the first error stops the fan-out for
    /// that frame.
    fn invoke(&self, payload: &[u8]) -> anyhow::Result<()>;
}

/// A handler that parses the payload into `T` before calling a closure.
pub struct EventFn<T, F> {
    name: String,
    callback: F,
    _payload: PhantomData<fn(T)>,
}

impl<T, F> EventHandler for EventFn<T, F>
where
    T: DeserializeOwned,
    F: Fn(T) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, payload: &[u8]) -> anyhow::Result<()> {
        let parsed: T = serde_json::from_slice(payload)?;
        (self.callback)(parsed);
        Ok(())
    }
}

/// Create a typed handler for an arbitrary event name.
///
/// Removal via `off` is by identity: keep a clone of the returned `Arc`
/// around if you intend to detach the handler later.
pub fn handler<T, F>(name: impl Into<String>, callback: F) -> Arc<EventFn<T, F>>
where
    T: DeserializeOwned,
    F: Fn(T) + Send + Sync,
{
    Arc::new(EventFn {
        name: name.into(),
        callback,
        _payload: PhantomData,
    })
}

/// Handler for the `READY` event.
pub fn ready<F>(callback: F) -> Arc<EventFn<Ready, F>>
where
    F: Fn(Ready) + Send + Sync,
{
    handler("READY", callback)
}

/// Handler for the `RESUMED` event.
pub fn resumed<F>(callback: F) -> Arc<EventFn<Resumed, F>>
where
    F: Fn(Resumed) + Send + Sync,
{
    handler("RESUMED", callback)
}

/// Handler for the `MESSAGE_CREATE` event.
pub fn message_create<F>(callback: F) -> Arc<EventFn<Message, F>>
where
    F: Fn(Message) + Send + Sync,
{
    handler("MESSAGE_CREATE", callback)
}

/// Handler for the `PRESENCE_UPDATE` event.
pub fn presence_update<F>(callback: F) -> Arc<EventFn<PresenceUpdate, F>>
where
    F: Fn(PresenceUpdate) + Send + Sync,
{
    handler("PRESENCE_UPDATE", callback)
}

/// Handler for the `TYPING_START` event.
pub fn typing_start<F>(callback: F) -> Arc<EventFn<TypingStart, F>>
where
    F: Fn(TypingStart) + Send + Sync,
{
    handler("TYPING_START", callback)
}
