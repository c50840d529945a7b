use chanlink_channel::ChannelError;

/// Why a connector operation failed.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// The single non-blocking send did not succeed.
    #[error("channel write failed: {0}")]
    Send(#[source] ChannelError),

    /// Waiting for channel readiness failed.
    #[error("waiting for a response failed: {0}")]
    Wait(#[source] ChannelError),

    /// The channel was readable but the message could not be read.
    #[error("reading the response failed: {0}")]
    Read(#[source] ChannelError),

    /// The peer closed its end and no message is pending. This is the normal
    /// end of a conversation, not a transport fault.
    #[error("peer closed the channel")]
    PeerClosed,
}

impl ConnectorError {
    /// Whether this is a clean end of conversation rather than a fault.
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, ConnectorError::PeerClosed)
    }

    /// The underlying channel status, if any.
    pub fn channel_error(&self) -> Option<&ChannelError> {
        match self {
            ConnectorError::Send(err) | ConnectorError::Wait(err) | ConnectorError::Read(err) => {
                Some(err)
            }
            ConnectorError::PeerClosed => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
