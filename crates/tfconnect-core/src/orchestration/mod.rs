//! Apply/destroy orchestration and the action-handling service.

pub mod locks;
pub mod orchestrator;
pub mod service;
pub mod state_key;
