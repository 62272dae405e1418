//! Activity module for the VaultAlert node.
//!
//! Counts what the node has seen and done during the current session so an
//! operator can audit it on shutdown.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, ActivityLog, ActivityStats, SharedActivityLog};
