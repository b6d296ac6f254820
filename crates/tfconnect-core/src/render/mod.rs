//! Workspace file production: the bootstrap and resource templates and
//! the variable file.

pub mod template;
pub mod variables;
