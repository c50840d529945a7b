use bytes::Bytes;
use chanlink_channel::Handle;

/// A byte payload plus the handles that travel with it.
#[derive(Debug, Default)]
pub struct Message {
    bytes: Bytes,
    handles: Vec<Handle>,
}

impl Message {
    /// Create a message from a payload and its handles.
    pub fn new(bytes: impl Into<Bytes>, handles: Vec<Handle>) -> Self {
        Self {
            bytes: bytes.into(),
            handles,
        }
    }

    /// Create a message with no handles.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, Vec::new())
    }

    /// The payload.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty. Handles are not considered.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Replace the payload, keeping the handles.
    pub fn set_bytes(&mut self, bytes: impl Into<Bytes>) {
        self.bytes = bytes.into();
    }

    /// Attached handles, in order.
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// Mutable access to the attached handles.
    pub fn handles_mut(&mut self) -> &mut Vec<Handle> {
        &mut self.handles
    }

    /// Detach all handles, leaving the payload in place.
    pub fn take_handles(&mut self) -> Vec<Handle> {
        std::mem::take(&mut self.handles)
    }

    /// Drop the payload and close every attached handle.
    pub fn clear(&mut self) {
        self.bytes = Bytes::new();
        self.handles.clear();
    }

    /// Split into payload and handles.
    pub fn into_parts(self) -> (Bytes, Vec<Handle>) {
        (self.bytes, self.handles)
    }
}
