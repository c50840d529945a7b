use std::io;

/// Errors reported by channel operations.
///
/// Every variant carries a stable negative [`code`](ChannelError::code) and a
/// symbolic [`name`](ChannelError::name) so callers can log the cause without
/// matching on it.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The operation cannot complete right now (no message queued, or the
    /// peer's receive queue is full).
    #[error("operation should wait")]
    ShouldWait,

    /// The other endpoint has been closed.
    #[error("peer closed")]
    PeerClosed,

    /// The deadline passed before any requested signal was observed.
    #[error("timed out")]
    TimedOut,

    /// A message exceeded the configured limits.
    #[error("{what} out of range ({size}, max {max})")]
    OutOfRange {
        what: &'static str,
        size: usize,
        max: usize,
    },

    /// A queued message did not fit in the receive buffers.
    #[error("{what} buffer too small for queued message (max {max})")]
    BufferTooSmall { what: &'static str, max: usize },

    /// A received datagram did not carry a valid message header.
    #[error("malformed message: {0}")]
    Malformed(&'static str),

    /// The call itself was invalid.
    #[error("invalid arguments: {0}")]
    InvalidArgs(&'static str),

    /// The underlying descriptor is not an open channel endpoint.
    #[error("bad handle")]
    BadHandle,

    /// Any other operating system error.
    #[error("channel I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ChannelError {
    /// Classify an OS error returned by a socket call.
    pub(crate) fn from_os(err: io::Error) -> Self {
        match err.raw_os_error() {
            Some(libc::EAGAIN) => ChannelError::ShouldWait,
            Some(libc::EPIPE) | Some(libc::ECONNRESET) | Some(libc::ENOTCONN) => {
                ChannelError::PeerClosed
            }
            Some(libc::EBADF) | Some(libc::ENOTSOCK) => ChannelError::BadHandle,
            _ => ChannelError::Io(err),
        }
    }

    /// Stable numeric status (a negated errno value).
    pub fn code(&self) -> i32 {
        let errno = match self {
            ChannelError::ShouldWait => libc::EAGAIN,
            ChannelError::PeerClosed => libc::EPIPE,
            ChannelError::TimedOut => libc::ETIMEDOUT,
            ChannelError::OutOfRange { .. } => libc::EMSGSIZE,
            ChannelError::BufferTooSmall { .. } => libc::ENOBUFS,
            ChannelError::Malformed(_) => libc::EBADMSG,
            ChannelError::InvalidArgs(_) => libc::EINVAL,
            ChannelError::BadHandle => libc::EBADF,
            ChannelError::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        };
        -errno
    }

    /// Symbolic status name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ChannelError::ShouldWait => "SHOULD_WAIT",
            ChannelError::PeerClosed => "PEER_CLOSED",
            ChannelError::TimedOut => "TIMED_OUT",
            ChannelError::OutOfRange { .. } => "OUT_OF_RANGE",
            ChannelError::BufferTooSmall { .. } => "BUFFER_TOO_SMALL",
            ChannelError::Malformed(_) => "MALFORMED",
            ChannelError::InvalidArgs(_) => "INVALID_ARGS",
            ChannelError::BadHandle => "BAD_HANDLE",
            ChannelError::Io(_) => "IO",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
