//! Synchronous message exchange for IDL bindings.
//!
//! For call sites that cannot run an event loop: write a request, then block
//! until the reply arrives or the peer goes away. One attempt per call, no
//! buffering, no timeout.

pub mod connector;
pub mod error;

pub use connector::SynchronousConnector;
pub use error::{ConnectorError, Result};
