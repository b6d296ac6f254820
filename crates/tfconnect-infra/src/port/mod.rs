//! Upstream action API integration.

pub mod client;
