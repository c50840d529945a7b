use bytes::Bytes;
use chanlink_channel::{Channel, Result};
use tracing::trace;

use crate::message::Message;

/// Write `message` to `channel` as one atomic send.
///
/// The handles are moved out of `message` whether or not the write succeeds;
/// the payload stays.
pub fn write_message(channel: &Channel, message: &mut Message) -> Result<()> {
    let bytes = message.bytes().clone();
    channel.write(&bytes, message.handles_mut())
}

/// Read one queued message from `channel` into `message`.
///
/// `message` is replaced only on success; on error it is left untouched.
pub fn read_message(channel: &Channel, message: &mut Message) -> Result<()> {
    let mut bytes = Vec::new();
    let mut handles = Vec::new();
    channel.read(&mut bytes, &mut handles)?;

    trace!(
        bytes = bytes.len(),
        handles = handles.len(),
        "populated message"
    );
    *message = Message::new(Bytes::from(bytes), handles);
    Ok(())
}
