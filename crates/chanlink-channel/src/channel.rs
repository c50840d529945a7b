use std::io;
use std::mem;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;

use tracing::{debug, trace};

use crate::error::{ChannelError, Result};
use crate::handle::Handle;
use crate::signals::{Deadline, Signals};
use crate::wire::{decode_header, encode_header, HEADER_SIZE};

/// Default maximum payload size per message: 64 KiB.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Default maximum number of handles per message.
pub const DEFAULT_MAX_MESSAGE_HANDLES: usize = 64;

/// Kernel cap on descriptors in one `SCM_RIGHTS` message (`SCM_MAX_FD`).
pub const MAX_MESSAGE_HANDLES_LIMIT: usize = 253;

/// Per-message limits shared by both endpoints of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Maximum payload size in bytes. Default: 64 KiB.
    pub max_message_bytes: usize,
    /// Maximum handles attached to one message. Default: 64.
    pub max_message_handles: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            max_message_handles: DEFAULT_MAX_MESSAGE_HANDLES,
        }
    }
}

/// One endpoint of a bidirectional, message-oriented channel.
#[derive(Debug)]
pub struct Channel {
    fd: OwnedFd,
    config: ChannelConfig,
}

/// What a non-destructive peek found at the head of the receive queue.
enum Pending {
    Message,
    Empty,
    Nothing,
}

impl Channel {
    /// Create a connected pair of endpoints with default limits.
    pub fn create() -> Result<(Self, Self)> {
        Self::create_with_config(ChannelConfig::default())
    }

    /// Create a connected pair of endpoints with explicit limits.
    pub fn create_with_config(config: ChannelConfig) -> Result<(Self, Self)> {
        if config.max_message_handles > MAX_MESSAGE_HANDLES_LIMIT {
            return Err(ChannelError::OutOfRange {
                what: "handle limit",
                size: config.max_message_handles,
                max: MAX_MESSAGE_HANDLES_LIMIT,
            });
        }

        let mut fds: [RawFd; 2] = [-1, -1];
        // SAFETY: `fds` is a valid writable array of two descriptors.
        let rc = unsafe {
            libc::socketpair(
                libc::AF_UNIX,
                libc::SOCK_SEQPACKET | libc::SOCK_CLOEXEC,
                0,
                fds.as_mut_ptr(),
            )
        };
        if rc != 0 {
            return Err(ChannelError::Io(io::Error::last_os_error()));
        }

        // SAFETY: socketpair succeeded, so both descriptors are open and owned
        // by nothing else in this process.
        let (left, right) =
            unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
        debug!(left = fds[0], right = fds[1], "created channel pair");

        Ok((Self { fd: left, config }, Self { fd: right, config }))
    }

    /// Wrap a handle as a channel endpoint with explicit limits.
    pub fn from_handle_with_config(handle: Handle, config: ChannelConfig) -> Self {
        Self {
            fd: handle.into_owned_fd(),
            config,
        }
    }

    /// Limits applied by this endpoint.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Whether the underlying descriptor is still open in this process.
    pub fn is_valid(&self) -> bool {
        // SAFETY: F_GETFD only inspects descriptor flags.
        unsafe { libc::fcntl(self.fd.as_raw_fd(), libc::F_GETFD) != -1 }
    }

    /// Write one message without blocking.
    ///
    /// `handles` is always drained: on success the handles move to the peer,
    /// on failure they are closed.
    pub fn write(&self, bytes: &[u8], handles: &mut Vec<Handle>) -> Result<()> {
        let handles = mem::take(handles);

        if bytes.len() > self.config.max_message_bytes {
            return Err(ChannelError::OutOfRange {
                what: "payload",
                size: bytes.len(),
                max: self.config.max_message_bytes,
            });
        }
        if handles.len() > self.config.max_message_handles {
            return Err(ChannelError::OutOfRange {
                what: "handle count",
                size: handles.len(),
                max: self.config.max_message_handles,
            });
        }

        let header = encode_header(handles.len() as u16);
        let mut iov = [
            libc::iovec {
                iov_base: header.as_ptr() as *mut libc::c_void,
                iov_len: header.len(),
            },
            libc::iovec {
                iov_base: bytes.as_ptr() as *mut libc::c_void,
                iov_len: bytes.len(),
            },
        ];

        let raw: Vec<RawFd> = handles.iter().map(AsRawFd::as_raw_fd).collect();
        let (mut control, control_len) = control_buffer(raw.len());

        // SAFETY: an all-zero msghdr is a valid empty header.
        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        msg.msg_iov = iov.as_mut_ptr();
        msg.msg_iovlen = iov.len() as _;

        if !raw.is_empty() {
            msg.msg_control = control.as_mut_ptr().cast();
            msg.msg_controllen = control_len as _;
            // SAFETY: the control buffer is aligned for cmsghdr and sized by
            // CMSG_SPACE for exactly `raw.len()` descriptors.
            unsafe {
                let cmsg = libc::CMSG_FIRSTHDR(&msg);
                (*cmsg).cmsg_level = libc::SOL_SOCKET;
                (*cmsg).cmsg_type = libc::SCM_RIGHTS;
                (*cmsg).cmsg_len = libc::CMSG_LEN(fd_bytes(raw.len())) as _;
                ptr::copy_nonoverlapping(
                    raw.as_ptr(),
                    libc::CMSG_DATA(cmsg).cast::<RawFd>(),
                    raw.len(),
                );
            }
        }

        let expected = header.len() + bytes.len();
        loop {
            // SAFETY: `msg` points at live iovecs and control data for the
            // duration of the call.
            let sent = unsafe {
                libc::sendmsg(
                    self.fd.as_raw_fd(),
                    &msg,
                    libc::MSG_DONTWAIT | libc::MSG_NOSIGNAL,
                )
            };
            if sent < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(ChannelError::from_os(err));
            }
            if sent as usize != expected {
                return Err(ChannelError::Io(io::Error::other(format!(
                    "short send on seqpacket socket ({sent} of {expected} bytes)"
                ))));
            }
            break;
        }

        trace!(
            bytes = bytes.len(),
            handles = handles.len(),
            "wrote channel message"
        );
        // The kernel holds its own references now; ours are released here.
        drop(handles);
        Ok(())
    }

    /// Read one queued message without blocking.
    ///
    /// Both vectors are cleared first and only populated on success. Returns
    /// `ShouldWait` when nothing is queued and `PeerClosed` when nothing is
    /// queued and the peer is gone.
    ///
    /// A message that exceeds this endpoint's limits stays queued and
    /// `BufferTooSmall` is returned. A malformed datagram is consumed and
    /// reported as `Malformed`.
    pub fn read(&self, bytes: &mut Vec<u8>, handles: &mut Vec<Handle>) -> Result<()> {
        bytes.clear();
        handles.clear();

        let result = self.read_into(bytes, handles);
        if result.is_err() {
            bytes.clear();
            handles.clear();
        }
        result
    }

    fn read_into(&self, bytes: &mut Vec<u8>, handles: &mut Vec<Handle>) -> Result<()> {
        self.check_queued()?;

        bytes.resize(HEADER_SIZE + self.config.max_message_bytes, 0);
        let mut iov = [libc::iovec {
            iov_base: bytes.as_mut_ptr().cast(),
            iov_len: bytes.len(),
        }];
        let (mut control, control_len) = control_buffer(self.config.max_message_handles);

        // SAFETY: an all-zero msghdr is a valid empty header.
        let mut msg: libc::msghdr = unsafe { mem::zeroed() };
        msg.msg_iov = iov.as_mut_ptr();
        msg.msg_iovlen = iov.len() as _;
        msg.msg_control = control.as_mut_ptr().cast();
        msg.msg_controllen = control_len as _;

        let received = loop {
            // SAFETY: `msg` points at live, writable buffers of the declared sizes.
            let n = unsafe {
                libc::recvmsg(
                    self.fd.as_raw_fd(),
                    &mut msg,
                    libc::MSG_DONTWAIT | libc::MSG_CMSG_CLOEXEC,
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(ChannelError::from_os(err));
            }
            break n as usize;
        };

        // Own every delivered descriptor before any validation can bail out.
        // SAFETY: recvmsg returned, so the control buffer holds well-formed
        // cmsg headers up to `msg_controllen`.
        let delivered = unsafe { take_rights(&msg) };

        if received == 0 {
            if self.peer_hung_up()? {
                return Err(ChannelError::PeerClosed);
            }
            return Err(ChannelError::Malformed("datagram shorter than header"));
        }
        if msg.msg_flags & libc::MSG_TRUNC != 0 {
            return Err(ChannelError::BufferTooSmall {
                what: "payload",
                max: self.config.max_message_bytes,
            });
        }
        if msg.msg_flags & libc::MSG_CTRUNC != 0 {
            return Err(ChannelError::BufferTooSmall {
                what: "handle",
                max: self.config.max_message_handles,
            });
        }

        let announced = decode_header(&bytes[..received])?;
        if announced as usize != delivered.len() {
            return Err(ChannelError::Malformed("handle count does not match header"));
        }

        bytes.truncate(received);
        bytes.drain(..HEADER_SIZE);
        handles.extend(delivered);

        trace!(
            bytes = bytes.len(),
            handles = handles.len(),
            "read channel message"
        );
        Ok(())
    }

    /// Reject the head-of-queue message without consuming it when it exceeds
    /// the configured limits. Datagrams without a valid header are left for
    /// `read_into` to consume and report.
    fn check_queued(&self) -> Result<()> {
        let mut head = [0u8; HEADER_SIZE];
        let length = loop {
            // SAFETY: `head` is a valid buffer of HEADER_SIZE bytes; MSG_PEEK
            // leaves the datagram queued and MSG_TRUNC reports its full length.
            let n = unsafe {
                libc::recv(
                    self.fd.as_raw_fd(),
                    head.as_mut_ptr().cast(),
                    head.len(),
                    libc::MSG_PEEK | libc::MSG_DONTWAIT | libc::MSG_TRUNC,
                )
            };
            if n >= 0 {
                break n as usize;
            }
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(ChannelError::from_os(err));
        };

        if length < HEADER_SIZE {
            return Ok(());
        }
        let Ok(announced) = decode_header(&head) else {
            return Ok(());
        };
        if length - HEADER_SIZE > self.config.max_message_bytes {
            return Err(ChannelError::BufferTooSmall {
                what: "payload",
                max: self.config.max_message_bytes,
            });
        }
        if announced as usize > self.config.max_message_handles {
            return Err(ChannelError::BufferTooSmall {
                what: "handle",
                max: self.config.max_message_handles,
            });
        }
        Ok(())
    }

    /// Whether the peer has shut down, without waiting.
    fn peer_hung_up(&self) -> Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.fd.as_raw_fd(),
            events: libc::POLLRDHUP,
            revents: 0,
        };
        loop {
            // SAFETY: `pfd` is a single valid pollfd.
            let rc = unsafe { libc::poll(&mut pfd, 1, 0) };
            if rc >= 0 {
                return Ok(pfd.revents & (libc::POLLHUP | libc::POLLRDHUP) != 0);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(ChannelError::from_os(err));
            }
        }
    }

    /// Block until any of `signals` is asserted or `deadline` passes.
    ///
    /// Returns every observed signal, which always intersects `signals`. If
    /// the peer is gone and none of the requested signals can ever be
    /// asserted, returns `PeerClosed`.
    pub fn wait_one(&self, signals: Signals, deadline: Deadline) -> Result<Signals> {
        if signals.is_empty() {
            return Err(ChannelError::InvalidArgs("empty signal set"));
        }

        let mut events: libc::c_short = 0;
        if signals.contains(Signals::READABLE) {
            events |= libc::POLLIN;
        }
        if signals.contains(Signals::PEER_CLOSED) {
            events |= libc::POLLRDHUP;
        }

        loop {
            let mut pfd = libc::pollfd {
                fd: self.fd.as_raw_fd(),
                events,
                revents: 0,
            };
            // SAFETY: `pfd` is a single valid pollfd.
            let rc = unsafe { libc::poll(&mut pfd, 1, deadline.poll_timeout()) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(ChannelError::from_os(err));
            }
            if rc == 0 {
                return Err(ChannelError::TimedOut);
            }
            if pfd.revents & libc::POLLNVAL != 0 {
                return Err(ChannelError::BadHandle);
            }

            let observed = self.observe(pfd.revents)?;
            if observed.intersects(signals) {
                return Ok(observed);
            }
            if observed.contains(Signals::PEER_CLOSED) {
                return Err(ChannelError::PeerClosed);
            }
            if pfd.revents & libc::POLLERR != 0 {
                return Err(ChannelError::Io(io::Error::other(
                    "error condition on channel socket",
                )));
            }
            trace!(revents = pfd.revents, "spurious channel wakeup");
        }
    }

    fn observe(&self, revents: libc::c_short) -> Result<Signals> {
        let mut observed = Signals::empty();
        let hung_up = revents & (libc::POLLHUP | libc::POLLRDHUP) != 0;
        if hung_up {
            observed |= Signals::PEER_CLOSED;
        }
        if revents & libc::POLLIN != 0 {
            match self.peek()? {
                Pending::Message => observed |= Signals::READABLE,
                // A zero-length datagram from a live peer is still a message.
                Pending::Empty if !hung_up => observed |= Signals::READABLE,
                Pending::Empty | Pending::Nothing => {}
            }
        }
        Ok(observed)
    }

    fn peek(&self) -> Result<Pending> {
        let mut probe = [0u8; 1];
        loop {
            // SAFETY: `probe` is a valid one-byte buffer; MSG_PEEK leaves the
            // queued datagram (and its descriptors) in place.
            let n = unsafe {
                libc::recv(
                    self.fd.as_raw_fd(),
                    probe.as_mut_ptr().cast(),
                    probe.len(),
                    libc::MSG_PEEK | libc::MSG_DONTWAIT,
                )
            };
            if n > 0 {
                return Ok(Pending::Message);
            }
            if n == 0 {
                return Ok(Pending::Empty);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return Ok(Pending::Nothing),
                _ => return Err(ChannelError::from_os(err)),
            }
        }
    }

    pub(crate) fn into_owned_fd(self) -> OwnedFd {
        self.fd
    }
}

impl From<Handle> for Channel {
    fn from(handle: Handle) -> Self {
        Self::from_handle_with_config(handle, ChannelConfig::default())
    }
}

impl AsFd for Channel {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for Channel {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

fn fd_bytes(count: usize) -> libc::c_uint {
    (count * mem::size_of::<RawFd>()) as libc::c_uint
}

/// Allocate a cmsghdr-aligned control buffer for `fd_count` descriptors.
fn control_buffer(fd_count: usize) -> (Vec<u64>, usize) {
    #[allow(unused_unsafe)]
    // SAFETY: CMSG_SPACE is a pure size computation.
    let space = unsafe { libc::CMSG_SPACE(fd_bytes(fd_count)) } as usize;
    (vec![0u64; space.div_ceil(mem::size_of::<u64>())], space)
}

/// Take ownership of every `SCM_RIGHTS` descriptor in a received message.
///
/// # Safety
///
/// `msg` must describe a control buffer filled in by a successful `recvmsg`.
unsafe fn take_rights(msg: &libc::msghdr) -> Vec<Handle> {
    let mut handles = Vec::new();
    // SAFETY: upheld by the caller; the CMSG_* walk stays within msg_controllen.
    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(msg);
        while !cmsg.is_null() {
            if (*cmsg).cmsg_level == libc::SOL_SOCKET && (*cmsg).cmsg_type == libc::SCM_RIGHTS {
                let data = libc::CMSG_DATA(cmsg).cast::<RawFd>();
                let payload = (*cmsg).cmsg_len as usize - libc::CMSG_LEN(0) as usize;
                for i in 0..payload / mem::size_of::<RawFd>() {
                    let fd = ptr::read_unaligned(data.add(i));
                    handles.push(Handle::from(OwnedFd::from_raw_fd(fd)));
                }
            }
            cmsg = libc::CMSG_NXTHDR(msg, cmsg);
        }
    }
    handles
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::{Read, Seek, SeekFrom, Write};
    use std::time::Duration;

    use super::*;

    fn temp_file(tag: &str, contents: &[u8]) -> File {
        let path = std::env::temp_dir().join(format!(
            "chanlink-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .expect("temp file should be creatable");
        file.write_all(contents).unwrap();
        std::fs::remove_file(&path).unwrap();
        file
    }

    #[test]
    fn write_then_read_bytes() {
        let (left, right) = Channel::create().unwrap();
        left.write(b"hello", &mut Vec::new()).unwrap();

        let mut bytes = Vec::new();
        let mut handles = Vec::new();
        right.read(&mut bytes, &mut handles).unwrap();

        assert_eq!(bytes, b"hello");
        assert!(handles.is_empty());
    }

    #[test]
    fn empty_payload_is_a_message() {
        let (left, right) = Channel::create().unwrap();
        left.write(b"", &mut Vec::new()).unwrap();

        let signals = right
            .wait_one(Signals::READABLE, Deadline::after(Duration::from_secs(1)))
            .unwrap();
        assert!(signals.contains(Signals::READABLE));

        let mut bytes = vec![0xFF];
        let mut handles = Vec::new();
        right.read(&mut bytes, &mut handles).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn handles_are_transferred() {
        let (left, right) = Channel::create().unwrap();
        let file = temp_file("xfer", b"capability");

        let mut outgoing = vec![Handle::from(file)];
        left.write(b"with-file", &mut outgoing).unwrap();
        assert!(outgoing.is_empty(), "write must consume handles");

        let mut bytes = Vec::new();
        let mut handles = Vec::new();
        right.read(&mut bytes, &mut handles).unwrap();
        assert_eq!(bytes, b"with-file");
        assert_eq!(handles.len(), 1);

        let mut received = File::from(OwnedFd::from(handles.pop().unwrap()));
        received.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = String::new();
        received.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "capability");
    }

    #[test]
    fn read_on_empty_channel_should_wait() {
        let (_left, right) = Channel::create().unwrap();
        let err = right.read(&mut Vec::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::ShouldWait));
    }

    #[test]
    fn read_after_peer_close_reports_peer_closed() {
        let (left, right) = Channel::create().unwrap();
        drop(left);
        let err = right.read(&mut Vec::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::PeerClosed));
    }

    #[test]
    fn write_after_peer_close_fails_without_blocking() {
        let (left, right) = Channel::create().unwrap();
        drop(right);
        let err = left.write(b"late", &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::PeerClosed));
    }

    #[test]
    fn oversized_payload_is_rejected_and_handles_closed() {
        let config = ChannelConfig {
            max_message_bytes: 8,
            ..ChannelConfig::default()
        };
        let (left, _right) = Channel::create_with_config(config).unwrap();
        let mut handles = vec![Handle::from(File::open("/dev/null").unwrap())];

        let err = left.write(&[0u8; 9], &mut handles).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::OutOfRange {
                what: "payload",
                size: 9,
                max: 8
            }
        ));
        assert!(handles.is_empty());
    }

    #[test]
    fn too_many_handles_is_rejected() {
        let config = ChannelConfig {
            max_message_handles: 1,
            ..ChannelConfig::default()
        };
        let (left, _right) = Channel::create_with_config(config).unwrap();
        let mut handles = vec![
            Handle::from(File::open("/dev/null").unwrap()),
            Handle::from(File::open("/dev/null").unwrap()),
        ];
        let err = left.write(b"x", &mut handles).unwrap_err();
        assert!(matches!(err, ChannelError::OutOfRange { .. }));
    }

    #[test]
    fn handle_limit_above_kernel_cap_is_rejected() {
        let config = ChannelConfig {
            max_message_handles: MAX_MESSAGE_HANDLES_LIMIT + 1,
            ..ChannelConfig::default()
        };
        assert!(matches!(
            Channel::create_with_config(config),
            Err(ChannelError::OutOfRange { .. })
        ));
    }

    #[test]
    fn receiver_with_smaller_limit_reports_buffer_too_small() {
        let (left, right) = Channel::create().unwrap();
        let right = Channel::from_handle_with_config(
            Handle::from(right),
            ChannelConfig {
                max_message_bytes: 4,
                ..ChannelConfig::default()
            },
        );
        left.write(b"too long for reader", &mut Vec::new()).unwrap();

        let mut bytes = Vec::new();
        let err = right.read(&mut bytes, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::BufferTooSmall { .. }));
        assert!(bytes.is_empty());
    }

    #[test]
    fn oversized_message_stays_queued() {
        let (left, right) = Channel::create().unwrap();
        let small = Channel::from_handle_with_config(
            Handle::from(right),
            ChannelConfig {
                max_message_bytes: 4,
                max_message_handles: 1,
            },
        );
        left.write(b"too long for reader", &mut Vec::new()).unwrap();

        let mut bytes = Vec::new();
        let err = small.read(&mut bytes, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::BufferTooSmall { what: "payload", .. }));

        let roomy = Channel::from(Handle::from(small));
        roomy.read(&mut bytes, &mut Vec::new()).unwrap();
        assert_eq!(bytes, b"too long for reader");
    }

    #[test]
    fn excess_handles_stay_queued() {
        let (left, right) = Channel::create().unwrap();
        let small = Channel::from_handle_with_config(
            Handle::from(right),
            ChannelConfig {
                max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
                max_message_handles: 1,
            },
        );
        let mut outgoing = vec![
            Handle::from(temp_file("excess-a", b"a")),
            Handle::from(temp_file("excess-b", b"b")),
        ];
        left.write(b"two", &mut outgoing).unwrap();

        let mut handles = Vec::new();
        let err = small.read(&mut Vec::new(), &mut handles).unwrap_err();
        assert!(matches!(err, ChannelError::BufferTooSmall { what: "handle", .. }));
        assert!(handles.is_empty());

        let roomy = Channel::from(Handle::from(small));
        roomy.read(&mut Vec::new(), &mut handles).unwrap();
        assert_eq!(handles.len(), 2);
    }

    fn raw_seqpacket_pair() -> (OwnedFd, OwnedFd) {
        let mut fds: [RawFd; 2] = [-1, -1];
        // SAFETY: `fds` has room for the two descriptors socketpair writes.
        let rc = unsafe {
            libc::socketpair(
                libc::AF_UNIX,
                libc::SOCK_SEQPACKET | libc::SOCK_CLOEXEC,
                0,
                fds.as_mut_ptr(),
            )
        };
        assert_eq!(rc, 0, "socketpair: {}", io::Error::last_os_error());
        // SAFETY: both descriptors are open and owned by nobody else.
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }

    #[test]
    fn zero_length_datagram_from_live_peer_is_malformed() {
        let (local, remote) = raw_seqpacket_pair();
        let rc = unsafe { libc::send(remote.as_raw_fd(), ptr::null(), 0, 0) };
        assert_eq!(rc, 0);
        let channel = Channel::from(Handle::from(local));

        let signals = channel
            .wait_one(
                Signals::READABLE | Signals::PEER_CLOSED,
                Deadline::after(Duration::from_secs(1)),
            )
            .unwrap();
        assert_eq!(signals, Signals::READABLE);

        let err = channel.read(&mut Vec::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::Malformed(_)));

        // The bad datagram was consumed and the peer is still connected.
        let err = channel.read(&mut Vec::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::ShouldWait));
        drop(remote);
    }

    #[test]
    fn headerless_datagram_is_malformed() {
        let (local, remote) = raw_seqpacket_pair();
        let rc = unsafe { libc::send(remote.as_raw_fd(), b"xy".as_ptr().cast(), 2, 0) };
        assert_eq!(rc, 2);
        let channel = Channel::from(Handle::from(local));

        let err = channel.read(&mut Vec::new(), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ChannelError::Malformed(_)));
        drop(remote);
    }

    #[test]
    fn wait_reports_readable() {
        let (left, right) = Channel::create().unwrap();
        left.write(b"x", &mut Vec::new()).unwrap();

        let signals = right
            .wait_one(
                Signals::READABLE | Signals::PEER_CLOSED,
                Deadline::after(Duration::from_secs(1)),
            )
            .unwrap();
        assert_eq!(signals, Signals::READABLE);
    }

    #[test]
    fn wait_reports_peer_closed_without_readable() {
        let (left, right) = Channel::create().unwrap();
        drop(left);

        let signals = right
            .wait_one(Signals::READABLE | Signals::PEER_CLOSED, Deadline::Infinite)
            .unwrap();
        assert_eq!(signals, Signals::PEER_CLOSED);
    }

    #[test]
    fn wait_reports_both_when_message_precedes_close() {
        let (left, right) = Channel::create().unwrap();
        left.write(b"last words", &mut Vec::new()).unwrap();
        drop(left);

        let signals = right
            .wait_one(Signals::READABLE | Signals::PEER_CLOSED, Deadline::Infinite)
            .unwrap();
        assert_eq!(signals, Signals::READABLE | Signals::PEER_CLOSED);
    }

    #[test]
    fn wait_for_readable_on_closed_peer_fails() {
        let (left, right) = Channel::create().unwrap();
        drop(left);

        let err = right
            .wait_one(Signals::READABLE, Deadline::Infinite)
            .unwrap_err();
        assert!(matches!(err, ChannelError::PeerClosed));
    }

    #[test]
    fn wait_times_out() {
        let (_left, right) = Channel::create().unwrap();
        let err = right
            .wait_one(
                Signals::READABLE,
                Deadline::after(Duration::from_millis(20)),
            )
            .unwrap_err();
        assert!(matches!(err, ChannelError::TimedOut));
    }

    #[test]
    fn wait_rejects_empty_signal_set() {
        let (_left, right) = Channel::create().unwrap();
        let err = right
            .wait_one(Signals::empty(), Deadline::Infinite)
            .unwrap_err();
        assert!(matches!(err, ChannelError::InvalidArgs(_)));
    }

    #[test]
    fn fresh_endpoint_is_valid() {
        let (left, _right) = Channel::create().unwrap();
        assert!(left.is_valid());
    }
}
