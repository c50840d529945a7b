use chanlink_channel::{Channel, ChannelError, Deadline, Signals};
use chanlink_message::{read_message, write_message, Message};
use tracing::{debug, warn};

use crate::error::{ConnectorError, Result};

/// Blocking request/response over one exclusively owned channel endpoint.
///
/// Both operations take `&mut self`; a connector is never shared between
/// threads without external serialization. Dropping the connector closes the
/// channel.
#[derive(Debug)]
pub struct SynchronousConnector {
    channel: Channel,
}

impl SynchronousConnector {
    /// Take ownership of `channel`. Performs no I/O.
    pub fn new(channel: Channel) -> Self {
        debug_assert!(
            channel.is_valid(),
            "synchronous connector requires an open channel"
        );
        Self { channel }
    }

    /// Send `message` with a single non-blocking write.
    ///
    /// Handles attached to `message` are transferred (or closed on failure).
    pub fn write(&mut self, message: &mut Message) -> Result<()> {
        debug_assert!(self.channel.is_valid(), "connector channel is closed");

        write_message(&self.channel, message).map_err(|err| {
            log_failure("channel write unsuccessful", &err);
            ConnectorError::Send(err)
        })
    }

    /// Block until a message arrives or the peer closes, then read it into
    /// `message`.
    ///
    /// A queued message is always delivered before the peer's closure is
    /// reported. `message` is only modified on success.
    pub fn blocking_read(&mut self, message: &mut Message) -> Result<()> {
        debug_assert!(self.channel.is_valid(), "connector channel is closed");

        let pending = self
            .channel
            .wait_one(Signals::READABLE | Signals::PEER_CLOSED, Deadline::Infinite)
            .map_err(|err| {
                log_failure("failed waiting for a response", &err);
                ConnectorError::Wait(err)
            })?;

        if pending.contains(Signals::READABLE) {
            return read_message(&self.channel, message).map_err(|err| {
                log_failure("failed reading the response message", &err);
                ConnectorError::Read(err)
            });
        }

        if pending.contains(Signals::PEER_CLOSED) {
            debug!("peer closed with no pending messages");
            return Err(ConnectorError::PeerClosed);
        }

        unreachable!("wait returned without an expected signal: pending = {pending:?}")
    }

    /// Write `request` and block for the reply in `response`.
    pub fn call(&mut self, request: &mut Message, response: &mut Message) -> Result<()> {
        self.write(request)?;
        self.blocking_read(response)
    }

    /// Borrow the owned channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Give the channel back without closing it.
    pub fn into_channel(self) -> Channel {
        self.channel
    }
}

fn log_failure(what: &str, err: &ChannelError) {
    warn!(code = err.code(), status = err.name(), error = %err, "{what}");
}

#[cfg(test)]
mod tests {
    use chanlink_message::Message;

    use super::*;

    #[test]
    fn connector_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SynchronousConnector>();
    }

    #[test]
    fn into_channel_keeps_endpoint_open() {
        let (local, remote) = Channel::create().unwrap();
        let connector = SynchronousConnector::new(local);
        let local = connector.into_channel();

        local.write(b"still open", &mut Vec::new()).unwrap();
        let mut incoming = Message::default();
        read_message(&remote, &mut incoming).unwrap();
        assert_eq!(incoming.bytes().as_ref(), b"still open");
    }

    #[test]
    fn write_failure_is_classified_as_send() {
        let (local, remote) = Channel::create().unwrap();
        drop(remote);

        let mut connector = SynchronousConnector::new(local);
        let err = connector
            .write(&mut Message::from_bytes(&b"x"[..]))
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Send(ChannelError::PeerClosed)));
    }

    #[test]
    fn oversized_reply_is_classified_as_read() {
        let (local, remote) = Channel::create().unwrap();
        let local = Channel::from_handle_with_config(
            local.into(),
            chanlink_channel::ChannelConfig {
                max_message_bytes: 2,
                ..Default::default()
            },
        );
        remote.write(b"too large", &mut Vec::new()).unwrap();

        let mut connector = SynchronousConnector::new(local);
        let mut reply = Message::default();
        let err = connector.blocking_read(&mut reply).unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::Read(ChannelError::BufferTooSmall { .. })
        ));
        assert!(reply.is_empty());
    }
}
