//! Typed OSC message arguments

use bytes::{Buf, BufMut, BytesMut};

use crate::wire;
use crate::{Error, Result, TYPETAG_PREFIX};

/// Typetag bytes for the supported argument types
pub mod tag {
    pub const INT: u8 = b'i';
    pub const FLOAT: u8 = b'f';
    pub const STRING: u8 = b's';
    pub const BLOB: u8 = b'b';
    pub const TRUE: u8 = b'T';
    pub const FALSE: u8 = b'F';
}

/// A single OSC argument.
///
/// Arguments are immutable once constructed. The typed readers fail
/// with [`Error::InvalidTypeTag`] on a variant mismatch instead of
/// coercing; equality across variants is `false`, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Blob(Vec<u8>),
}

impl Argument {
    /// The argument's typetag byte.
    pub fn typetag(&self) -> u8 {
        match self {
            Argument::Int(_) => tag::INT,
            Argument::Float(_) => tag::FLOAT,
            Argument::Bool(true) => tag::TRUE,
            Argument::Bool(false) => tag::FALSE,
            Argument::String(_) => tag::STRING,
            Argument::Blob(_) => tag::BLOB,
        }
    }

    /// Encoded payload size. Booleans live entirely in the typetag.
    pub fn encoded_len(&self) -> usize {
        match self {
            Argument::Int(_) | Argument::Float(_) => 4,
            Argument::Bool(_) => 0,
            Argument::String(s) => wire::str_len(s),
            Argument::Blob(b) => wire::blob_len(b),
        }
    }

    /// Append the argument payload to `buf`.
    pub fn put(&self, buf: &mut BytesMut) {
        match self {
            Argument::Int(i) => buf.put_i32(*i),
            Argument::Float(f) => buf.put_f32(*f),
            Argument::Bool(_) => {}
            Argument::String(s) => wire::put_str(buf, s),
            Argument::Blob(b) => wire::put_blob(buf, b),
        }
    }

    /// Decode one argument for the given typetag byte. Returns the
    /// argument and the number of payload bytes consumed.
    pub fn read(tt: u8, data: &[u8]) -> Result<(Argument, usize)> {
        match tt {
            tag::INT => {
                if data.len() < 4 {
                    return Err(Error::BufferTooSmall {
                        needed: 4,
                        have: data.len(),
                    });
                }
                Ok((Argument::Int((&data[..4]).get_i32()), 4))
            }
            tag::FLOAT => {
                if data.len() < 4 {
                    return Err(Error::BufferTooSmall {
                        needed: 4,
                        have: data.len(),
                    });
                }
                Ok((Argument::Float((&data[..4]).get_f32()), 4))
            }
            tag::TRUE => Ok((Argument::Bool(true), 0)),
            tag::FALSE => Ok((Argument::Bool(false), 0)),
            tag::STRING => {
                let (s, used) = wire::read_str(data);
                Ok((Argument::String(s), used))
            }
            tag::BLOB => {
                let (b, used) = wire::read_blob(data)?;
                Ok((Argument::Blob(b), used))
            }
            other => Err(Error::InvalidTypeTag(other)),
        }
    }

    /// Read the value as an i32.
    pub fn int32(&self) -> Result<i32> {
        match self {
            Argument::Int(i) => Ok(*i),
            _ => Err(Error::InvalidTypeTag(self.typetag())),
        }
    }

    /// Read the value as an f32.
    pub fn float32(&self) -> Result<f32> {
        match self {
            Argument::Float(f) => Ok(*f),
            _ => Err(Error::InvalidTypeTag(self.typetag())),
        }
    }

    /// Read the value as a bool.
    pub fn boolean(&self) -> Result<bool> {
        match self {
            Argument::Bool(b) => Ok(*b),
            _ => Err(Error::InvalidTypeTag(self.typetag())),
        }
    }

    /// Read the value as a string.
    pub fn string(&self) -> Result<&str> {
        match self {
            Argument::String(s) => Ok(s),
            _ => Err(Error::InvalidTypeTag(self.typetag())),
        }
    }

    /// Read the value as a blob.
    pub fn blob(&self) -> Result<&[u8]> {
        match self {
            Argument::Blob(b) => Ok(b),
            _ => Err(Error::InvalidTypeTag(self.typetag())),
        }
    }
}

impl From<i32> for Argument {
    fn from(v: i32) -> Self {
        Argument::Int(v)
    }
}

impl From<f32> for Argument {
    fn from(v: f32) -> Self {
        Argument::Float(v)
    }
}

impl From<bool> for Argument {
    fn from(v: bool) -> Self {
        Argument::Bool(v)
    }
}

impl From<&str> for Argument {
    fn from(v: &str) -> Self {
        Argument::String(v.to_string())
    }
}

impl From<String> for Argument {
    fn from(v: String) -> Self {
        Argument::String(v)
    }
}

impl From<Vec<u8>> for Argument {
    fn from(v: Vec<u8>) -> Self {
        Argument::Blob(v)
    }
}

/// Decode every argument named by `typetags` from `payload`.
///
/// A leading `,` prefix is stripped if present. Failures carry the
/// zero-based index of the offending argument and wrap the underlying
/// cause.
pub fn read_arguments(typetags: &[u8], payload: &[u8]) -> Result<Vec<Argument>> {
    let tags = match typetags.first() {
        Some(&TYPETAG_PREFIX) => &typetags[1..],
        _ => typetags,
    };
    let mut args = Vec::with_capacity(tags.len());
    let mut data = payload;
    for (index, &tt) in tags.iter().enumerate() {
        let (arg, used) = Argument::read(tt, data).map_err(|e| Error::Argument {
            index,
            source: Box::new(e),
        })?;
        args.push(arg);
        data = &data[used..];
    }
    Ok(args)
}
