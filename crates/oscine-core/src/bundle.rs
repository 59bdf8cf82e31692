//! OSC bundle codec

use std::time::SystemTime;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::message::Message;
use crate::packet::Packet;
use crate::timetag::{Timetag, TIMETAG_SIZE};
use crate::{Error, Result, BUNDLE_CHAR, BUNDLE_TAG, MAX_BUNDLE_DEPTH, MESSAGE_CHAR};

/// An OSC bundle: a time tag plus zero or more packets, each of which
/// may itself be a bundle.
///
/// On the wire every element is prefixed with its encoded length as a
/// big-endian i32, so a reader can skip elements without decoding
/// them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bundle {
    pub timetag: Timetag,
    pub packets: Vec<Packet>,
}

impl Bundle {
    /// Create an empty bundle with the given time tag.
    pub fn new(timetag: Timetag) -> Self {
        Self {
            timetag,
            packets: Vec::new(),
        }
    }

    /// Bundle due at the given wall-clock time.
    pub fn at(time: SystemTime) -> Self {
        Self::new(Timetag::from_time(time))
    }

    /// Bundle to be dispatched immediately.
    pub fn immediate() -> Self {
        Self::new(Timetag::IMMEDIATELY)
    }

    /// Builder-style packet append.
    pub fn with(mut self, packet: impl Into<Packet>) -> Self {
        self.packets.push(packet.into());
        self
    }

    /// Append a packet.
    pub fn push(&mut self, packet: impl Into<Packet>) {
        self.packets.push(packet.into());
    }

    /// Encoded size, for buffer pre-allocation.
    pub fn encoded_len(&self) -> usize {
        BUNDLE_TAG.len()
            + TIMETAG_SIZE
            + self
                .packets
                .iter()
                .map(|p| 4 + p.encoded_len())
                .sum::<usize>()
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.put(&mut buf);
        buf.freeze()
    }

    pub(crate) fn put(&self, buf: &mut BytesMut) {
        buf.put_slice(BUNDLE_TAG);
        self.timetag.put(buf);
        for packet in &self.packets {
            buf.put_i32(packet.encoded_len() as i32);
            packet.put(buf);
        }
    }

    /// Parse a bundle from wire bytes.
    pub fn parse(data: &[u8]) -> Result<Bundle> {
        Self::parse_at_depth(data, 0)
    }

    fn parse_at_depth(data: &[u8], depth: usize) -> Result<Bundle> {
        if depth >= MAX_BUNDLE_DEPTH {
            return Err(Error::BundleTooDeep(MAX_BUNDLE_DEPTH));
        }
        if data.len() < BUNDLE_TAG.len() {
            return Err(Error::BufferTooSmall {
                needed: BUNDLE_TAG.len(),
                have: data.len(),
            });
        }
        let (tag, rest) = data.split_at(BUNDLE_TAG.len());
        if tag != BUNDLE_TAG {
            return Err(Error::InvalidBundleTag {
                expected: BUNDLE_TAG.to_vec(),
                actual: tag.to_vec(),
            });
        }
        let timetag = Timetag::read(rest)?;
        let mut rest = &rest[TIMETAG_SIZE..];

        let mut packets = Vec::new();
        while rest.len() >= 4 {
            let len = (&rest[..4]).get_i32();
            if len <= 0 {
                break;
            }
            let len = len as usize;
            let body = &rest[4..];
            if len > body.len() {
                return Err(Error::ElementLength {
                    claimed: len,
                    have: body.len(),
                });
            }
            let element = &body[..len];
            let index = packets.len();
            let wrap = |e| Error::Element {
                index,
                source: Box::new(e),
            };
            match element[0] {
                MESSAGE_CHAR => {
                    packets.push(Packet::Message(Message::parse(element).map_err(wrap)?))
                }
                BUNDLE_CHAR => packets.push(Packet::Bundle(
                    Bundle::parse_at_depth(element, depth + 1).map_err(wrap)?,
                )),
                // A NUL where an element should begin marks the end of
                // the packet region (zero padding in a larger buffer).
                0 => break,
                other => {
                    return Err(wrap(Error::Parse(format!(
                        "element must start with '/' or '#', got 0x{other:02x}"
                    ))))
                }
            }
            rest = &body[len..];
        }
        Ok(Bundle { timetag, packets })
    }
}
