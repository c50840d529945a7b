use std::time::{Duration, Instant};

bitflags::bitflags! {
    /// Readiness conditions observable on a channel endpoint.
    ///
    /// The two conditions are not mutually exclusive: a peer may write a
    /// message and close its end before the reader wakes up.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Signals: u32 {
        /// At least one message is queued for reading.
        const READABLE = 1 << 0;
        /// The other endpoint has been closed.
        const PEER_CLOSED = 1 << 2;
    }
}

/// When a blocking wait gives up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Never give up.
    Infinite,
    /// Give up once this instant has passed.
    At(Instant),
}

impl Deadline {
    /// A deadline `timeout` from now. Saturates to [`Deadline::Infinite`].
    pub fn after(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or(Deadline::Infinite, Deadline::At)
    }

    /// Remaining time as a `poll(2)` timeout in milliseconds (`-1` = forever).
    pub(crate) fn poll_timeout(&self) -> libc::c_int {
        match self {
            Deadline::Infinite => -1,
            Deadline::At(instant) => {
                let remaining = instant.saturating_duration_since(Instant::now());
                // Round up so a sub-millisecond remainder still waits.
                let millis = remaining.as_nanos().div_ceil(1_000_000);
                millis.min(libc::c_int::MAX as u128) as libc::c_int
            }
        }
    }
}
