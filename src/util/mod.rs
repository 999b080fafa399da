//! Shared utilities

pub mod task;
pub mod time;
