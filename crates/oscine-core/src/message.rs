//! OSC message codec

use bytes::{Bytes, BytesMut};

use crate::argument::{self, Argument};
use crate::pattern;
use crate::wire;
use crate::{Error, Result, TYPETAG_PREFIX};

/// An OSC message: an address pattern plus zero or more typed
/// arguments.
///
/// The typetag string is derived from the arguments on encode and is
/// the single source of truth for the payload layout on decode; it is
/// never stored separately.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    pub address: String,
    pub args: Vec<Argument>,
}

impl Message {
    /// Create a message with no arguments.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Builder-style argument append.
    pub fn with(mut self, arg: impl Into<Argument>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append an argument.
    pub fn push(&mut self, arg: impl Into<Argument>) {
        self.args.push(arg.into());
    }

    /// The derived typetag string: `,` followed by one tag byte per
    /// argument.
    pub fn typetag_string(&self) -> String {
        let mut s = String::with_capacity(1 + self.args.len());
        s.push(TYPETAG_PREFIX as char);
        for arg in &self.args {
            s.push(arg.typetag() as char);
        }
        s
    }

    /// Argument at `index`, or `IndexOutOfBounds`.
    pub fn arg(&self, index: usize) -> Result<&Argument> {
        self.args.get(index).ok_or(Error::IndexOutOfBounds {
            index,
            len: self.args.len(),
        })
    }

    /// Encoded size, for buffer pre-allocation.
    pub fn encoded_len(&self) -> usize {
        wire::str_len(&self.address)
            + wire::aligned(1 + self.args.len() + 1)
            + self.args.iter().map(Argument::encoded_len).sum::<usize>()
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.put(&mut buf);
        buf.freeze()
    }

    pub(crate) fn put(&self, buf: &mut BytesMut) {
        wire::put_str(buf, &self.address);
        wire::put_str(buf, &self.typetag_string());
        for arg in &self.args {
            arg.put(buf);
        }
    }

    /// Parse a message from wire bytes.
    ///
    /// The address is read first; the next region must be a typetag
    /// string starting with `,`. Argument decode failures carry the
    /// argument's zero-based index.
    pub fn parse(data: &[u8]) -> Result<Message> {
        let (address, used) = wire::read_str(data);
        if address.is_empty() {
            return Err(Error::Parse("missing address".to_string()));
        }
        let rest = &data[used..];
        match rest.first() {
            Some(&TYPETAG_PREFIX) => {}
            Some(&other) => return Err(Error::InvalidTypeTag(other)),
            None => {
                return Err(Error::BufferTooSmall {
                    needed: 4,
                    have: 0,
                })
            }
        }
        let (typetags, used) = wire::read_str(rest);
        let args = argument::read_arguments(typetags.as_bytes(), &rest[used..])?;
        Ok(Message { address, args })
    }

    /// Match this message's address pattern against a registered
    /// literal address.
    pub fn matches(&self, address: &str) -> Result<bool> {
        pattern::match_address(&self.address, address)
    }
}
