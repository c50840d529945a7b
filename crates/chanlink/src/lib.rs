//! Synchronous request/response over message channels.
//!
//! # Crate Structure
//!
//! - [`channel`] — Channel endpoints, handles, readiness signals
//! - [`message`] — Byte payload plus handles, and channel transfer helpers
//! - [`bindings`] — The blocking [`SynchronousConnector`](bindings::SynchronousConnector)

/// Re-export channel types.
pub mod channel {
    pub use chanlink_channel::*;
}

/// Re-export message types.
pub mod message {
    pub use chanlink_message::*;
}

/// Re-export connector types.
pub mod bindings {
    pub use chanlink_bindings::*;
}
