//! Network link for the VaultAlert node.
//!
//! The reporting cycle only asks whether the link is up and, if not,
//! requests a reconnect. How the link is actually brought up belongs to
//! the platform.

pub mod probe;

pub use probe::{LinkError, ProbeLink, DEFAULT_RECHECK_INTERVAL};

/// Status of the node's network link.
pub trait NetworkLink {
    /// Whether the link is currently established. Must not block.
    fn is_connected(&mut self) -> bool;

    /// Start bringing the link back up.
    ///
    /// Fire-and-forget: the result shows up in a later `is_connected()`.
    fn attempt_reconnect(&mut self);
}
