//! Integration test utilities for the gateway client
//!
//! This crate provides helpers for running end-to-end tests against an
//! in-process mock gateway server.

pub mod helpers;

pub use helpers::*;
