//! Business logic and port definitions for tfconnect.
//!
//! This crate defines the "ports" (engine driver and status reporter
//! traits) that the infrastructure layer implements, plus the
//! orchestration that turns an action event into an engine run. It
//! depends only on `tfconnect-types` -- never on `tfconnect-infra` or any
//! process/HTTP crate.

pub mod engine;
pub mod orchestration;
pub mod render;
pub mod report;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;
