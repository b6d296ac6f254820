//! Engine driver implementations.

pub mod terraform;
