//! Error taxonomy
//!
//! Every error observable at the socket boundary is a [`GatewayError`].
//! Errors are either *disruptions*, transient failures that trigger the
//! reconnect protocol, or *fatal*, which terminate the socket.

mod gateway_error;

pub use gateway_error::GatewayError;
