//! Shared domain types for tfconnect.
//!
//! Action events and their wire format, state keys, variable sets, run
//! outcomes, configuration, and the error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, semver,
//! secrecy, thiserror.

pub mod action;
pub mod config;
pub mod error;
pub mod state;
pub mod variables;
