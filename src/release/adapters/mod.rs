//! Adapter implementations for release synchronization ports.

pub mod git;
pub mod jira;
pub mod memory;
