//! Message-oriented channel endpoints.
//!
//! A [`Channel`] is one end of a bidirectional pair. Each write enqueues one
//! whole message (bytes plus transferable [`Handle`]s) or nothing at all, and
//! each read dequeues exactly one message. Readiness is observed through
//! [`Channel::wait_one`], which reports [`Signals::READABLE`] and
//! [`Signals::PEER_CLOSED`].
//!
//! On Linux the pair is an `AF_UNIX`/`SOCK_SEQPACKET` socket pair and handles
//! travel as `SCM_RIGHTS` file descriptors.

#[cfg(not(target_os = "linux"))]
compile_error!("chanlink-channel currently supports Linux only");

pub mod channel;
pub mod error;
pub mod handle;
pub mod signals;
pub mod wire;

pub use channel::{
    Channel, ChannelConfig, DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_MAX_MESSAGE_HANDLES,
    MAX_MESSAGE_HANDLES_LIMIT,
};
pub use error::{ChannelError, Result};
pub use handle::Handle;
pub use signals::{Deadline, Signals};
