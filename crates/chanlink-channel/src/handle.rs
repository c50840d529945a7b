use std::fs::File;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd};

use crate::channel::Channel;
use crate::error::Result;

/// A transferable capability reference.
///
/// Owns exactly one file descriptor. Handles are move-only: attaching one to
/// a message and writing it moves the descriptor to the peer process or thread.
#[derive(Debug)]
pub struct Handle(OwnedFd);

impl Handle {
    /// Duplicate the descriptor into a second, independent handle.
    pub fn duplicate(&self) -> Result<Self> {
        Ok(Self(self.0.try_clone()?))
    }

    /// Treat this handle as a channel endpoint using the default limits.
    ///
    /// No check is made that the descriptor really is a channel endpoint;
    /// channel operations on anything else fail with `BadHandle` or an I/O error.
    pub fn into_channel(self) -> Channel {
        Channel::from(self)
    }

    /// Release the underlying descriptor.
    pub fn into_owned_fd(self) -> OwnedFd {
        self.0
    }
}

impl From<OwnedFd> for Handle {
    fn from(fd: OwnedFd) -> Self {
        Self(fd)
    }
}

impl From<File> for Handle {
    fn from(file: File) -> Self {
        Self(OwnedFd::from(file))
    }
}

impl From<Channel> for Handle {
    fn from(channel: Channel) -> Self {
        Self(channel.into_owned_fd())
    }
}

impl From<Handle> for OwnedFd {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}

impl AsFd for Handle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl AsRawFd for Handle {
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw_fd()
    }
}

impl IntoRawFd for Handle {
    fn into_raw_fd(self) -> RawFd {
        self.0.into_raw_fd()
    }
}
