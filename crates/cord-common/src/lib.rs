//! # cord-common
//!
//! Shared utilities for the cord gateway client: the error taxonomy that
//! flows through the socket's error stream, and telemetry setup.

pub mod error;
pub mod telemetry;

pub use error::GatewayError;
pub use telemetry::{init_tracing, init_tracing_with_config, try_init_tracing, TracingConfig};
