//! Packet sum type

use bytes::{Bytes, BytesMut};

use crate::bundle::Bundle;
use crate::message::Message;
use crate::{Error, Result, BUNDLE_CHAR, MESSAGE_CHAR};

/// A parsed OSC packet: either a message or a bundle.
///
/// Every consumption site matches exhaustively, so a future packet
/// kind cannot be silently ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Message(Message),
    Bundle(Bundle),
}

impl Packet {
    /// Encoded size, for buffer pre-allocation.
    pub fn encoded_len(&self) -> usize {
        match self {
            Packet::Message(m) => m.encoded_len(),
            Packet::Bundle(b) => b.encoded_len(),
        }
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Bytes {
        match self {
            Packet::Message(m) => m.encode(),
            Packet::Bundle(b) => b.encode(),
        }
    }

    pub(crate) fn put(&self, buf: &mut BytesMut) {
        match self {
            Packet::Message(m) => m.put(buf),
            Packet::Bundle(b) => b.put(buf),
        }
    }

    /// Parse a packet, sniffing the leading byte to pick the decoder:
    /// `/` starts a message, `#` a bundle.
    pub fn parse(data: &[u8]) -> Result<Packet> {
        match data.first() {
            Some(&MESSAGE_CHAR) => Ok(Packet::Message(Message::parse(data)?)),
            Some(&BUNDLE_CHAR) => Ok(Packet::Bundle(Bundle::parse(data)?)),
            Some(&other) => Err(Error::Parse(format!(
                "packet must start with '/' or '#', got 0x{other:02x}"
            ))),
            None => Err(Error::BufferTooSmall { needed: 1, have: 0 }),
        }
    }
}

impl From<Message> for Packet {
    fn from(m: Message) -> Self {
        Packet::Message(m)
    }
}

impl From<Bundle> for Packet {
    fn from(b: Bundle) -> Self {
        Packet::Bundle(b)
    }
}
