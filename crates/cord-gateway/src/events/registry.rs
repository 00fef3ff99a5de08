//! Event registry
//!
//! Maps event names to persistent and one-shot handlers and fans dispatch
//! payloads out to them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::EventHandler;

type SharedHandler = Arc<dyn EventHandler>;

#[derive(Default)]
struct RegistryInner {
    handlers: HashMap<String, Vec<SharedHandler>>,
    onces: HashMap<String, Vec<SharedHandler>>,
}

/// Thread-safe event-emitter keyed by event name.
///
/// Handlers are compared by pointer identity: detaching requires the same
/// `Arc` value that was attached.
#[derive(Default)]
pub struct EventRegistry {
    inner: Mutex<RegistryInner>,
}

impl EventRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a handler that is called every time its event is received.
    pub fn on(&self, handler: SharedHandler) {
        let mut inner = self.lock();
        inner
            .handlers
            .entry(handler.name().to_string())
            .or_default()
            .push(handler);
    }

    /// Attach a handler that is called the next time its event is received,
    /// then detached.
    pub fn once(&self, handler: SharedHandler) {
        let mut inner = self.lock();
        inner
            .onces
            .entry(handler.name().to_string())
            .or_default()
            .push(handler);
    }

    /// Detach a previously-attached handler.
    ///
    /// Removes the first identity-matching occurrence from each of the
    /// persistent and one-shot lists; a no-op if the handler is absent.
    pub fn off(&self, handler: &SharedHandler) {
        let mut inner = self.lock();
        if let Some(list) = inner.handlers.get_mut(handler.name()) {
            remove_first(list, handler);
        }
        if let Some(list) = inner.onces.get_mut(handler.name()) {
            remove_first(list, handler);
        }
    }

    /// Invoke all handlers listening on `event` with the payload bytes.
    ///
    /// Handlers fire in registration order, persistent before one-shot, and
    /// the first error stops the fan-out. Handlers attached while a
    /// dispatch is in flight do not observe that dispatch.
    pub fn dispatch(&self, event: &str, payload: &[u8]) -> anyhow::Result<()> {
        let snapshot: Vec<SharedHandler> = {
            let mut inner = self.lock();
            let mut list: Vec<SharedHandler> = inner
                .handlers
                .get(event)
                .map(|handlers| handlers.to_vec())
                .unwrap_or_default();
            if let Some(onces) = inner.onces.get_mut(event) {
                list.append(onces);
            }
            list
        };

        for handler in snapshot {
            handler.invoke(payload)?;
        }

        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn remove_first(list: &mut Vec<SharedHandler>, target: &SharedHandler) {
    if let Some(index) = list.iter().position(|h| Arc::ptr_eq(h, target)) {
        list.remove(index);
    }
}
