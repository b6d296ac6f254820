//! Infrastructure layer for tfconnect.
//!
//! Contains implementations of the ports defined in `tfconnect-core`: the
//! terraform subprocess driver and the upstream status client, plus
//! webhook signature verification and the configuration loader.

pub mod config;
pub mod engine;
pub mod port;
pub mod webhook;
