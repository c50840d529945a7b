//! The unit of transfer on a chanlink channel.
//!
//! A [`Message`] pairs a flat byte payload with an ordered list of
//! transferable handles. [`write_message`] and [`read_message`] move one
//! message across a [`Channel`](chanlink_channel::Channel).

pub mod message;
pub mod transfer;

pub use message::Message;
pub use transfer::{read_message, write_message};
