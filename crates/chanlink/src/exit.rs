use std::fmt;
use std::io;

use chanlink_bindings::ConnectorError;
use chanlink_channel::ChannelError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn channel_error(context: &str, err: ChannelError) -> CliError {
    match err {
        ChannelError::Io(source) => io_error(context, source),
        ChannelError::PeerClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        ChannelError::OutOfRange { .. }
        | ChannelError::BufferTooSmall { .. }
        | ChannelError::Malformed(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn connector_error(context: &str, err: ConnectorError) -> CliError {
    match err {
        ConnectorError::Send(err) | ConnectorError::Wait(err) | ConnectorError::Read(err) => {
            channel_error(context, err)
        }
        ConnectorError::PeerClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_closed_maps_to_failure() {
        let err = connector_error("call failed", ConnectorError::PeerClosed);
        assert_eq!(err.code, FAILURE);
        assert_eq!(err.to_string(), "call failed: peer closed the channel");
    }

    #[test]
    fn oversized_message_maps_to_data_invalid() {
        let err = connector_error(
            "call failed",
            ConnectorError::Send(ChannelError::OutOfRange {
                what: "payload",
                size: 10,
                max: 1,
            }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn bad_handle_maps_to_transport_error() {
        let err = channel_error("wait failed", ChannelError::BadHandle);
        assert_eq!(err.code, TRANSPORT_ERROR);
    }
}
