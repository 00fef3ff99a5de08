//! Event subscription surface
//!
//! Handlers subscribe to named dispatch events; the registry fans incoming
//! payloads out to them in registration order.

mod handler;
mod registry;

pub use handler::{
    handler, message_create, presence_update, ready, resumed, typing_start, EventFn, EventHandler,
};
pub use registry::EventRegistry;
