//! Inbound webhook authentication.

pub mod signature;
