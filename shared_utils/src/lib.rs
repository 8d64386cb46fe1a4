//! Small helpers shared across the workspace members.

pub mod env;
