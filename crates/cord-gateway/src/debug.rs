//! Traffic debugger
//!
//! A [`Debugger`] can be passed into the options to observe all socket
//! sends, receives, connection attempts and errors.

use cord_common::GatewayError;

/// Observer for socket traffic and lifecycle events.
pub trait Debugger: Send + Sync {
    /// Called with the raw packet bytes received from the gateway, after
    /// inflation of compressed frames.
    fn incoming(&self, bytes: &[u8]);

    /// Called with the bytes of every packet written to the gateway.
    fn outgoing(&self, bytes: &[u8]);

    /// Called when the socket starts connecting to an endpoint.
    fn connecting(&self, endpoint: &str);

    /// Called when an error occurs on the socket. The error is also sent
    /// down the `errs()` channel.
    fn error(&self, err: &GatewayError);
}

/// The default debugger; observes nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDebugger;

impl Debugger for NoopDebugger {
    fn incoming(&self, _bytes: &[u8]) {}
    fn outgoing(&self, _bytes: &[u8]) {}
    fn connecting(&self, _endpoint: &str) {}
    fn error(&self, _err: &GatewayError) {}
}

/// A debugger that mirrors traffic onto `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceDebugger;

impl Debugger for TraceDebugger {
    fn incoming(&self, bytes: &[u8]) {
        tracing::debug!(frame = %String::from_utf8_lossy(bytes), "<<<");
    }

    fn outgoing(&self, bytes: &[u8]) {
        tracing::debug!(frame = %String::from_utf8_lossy(bytes), ">>>");
    }

    fn connecting(&self, endpoint: &str) {
        tracing::debug!(endpoint = %endpoint, "connecting");
    }

    fn error(&self, err: &GatewayError) {
        tracing::warn!(error = %err, code = err.code(), "socket error");
    }
}
