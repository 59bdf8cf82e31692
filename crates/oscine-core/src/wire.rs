//! OSC wire primitives
//!
//! Everything on the wire is 4-byte aligned. OSC-strings are NUL
//! terminated and padded to the boundary with further NULs; blobs
//! carry a big-endian i32 length and pad the payload alone. The empty
//! string encodes as zero bytes, not four NULs.

use bytes::{Buf, BufMut, BytesMut};

use crate::{Error, Result};

/// Round `len` up to the next multiple of 4. Aligned lengths stay
/// as-is.
pub fn aligned(len: usize) -> usize {
    (len + 3) & !3
}

/// Encoded size of an OSC-string, terminator and padding included.
pub fn str_len(s: &str) -> usize {
    if s.is_empty() {
        0
    } else {
        aligned(s.len() + 1)
    }
}

/// Append an OSC-string: UTF-8 bytes, a NUL terminator, then NUL
/// padding to the 4-byte boundary. The empty string appends nothing.
pub fn put_str(buf: &mut BytesMut, s: &str) {
    if s.is_empty() {
        return;
    }
    buf.put_slice(s.as_bytes());
    buf.put_bytes(0, aligned(s.len() + 1) - s.len());
}

/// Read an OSC-string. Returns the string and the number of bytes
/// consumed (a multiple of 4, at least 4 for non-empty input).
///
/// A buffer with no NUL terminator is consumed whole and returned as
/// the string rather than rejected; truncated padding is likewise
/// tolerated. Invalid UTF-8 is replaced, not refused.
pub fn read_str(data: &[u8]) -> (String, usize) {
    match data.iter().position(|&b| b == 0) {
        Some(end) => {
            let s = String::from_utf8_lossy(&data[..end]).into_owned();
            (s, aligned(end + 1).min(data.len()))
        }
        None => (String::from_utf8_lossy(data).into_owned(), data.len()),
    }
}

/// Encoded size of a blob: length prefix plus padded payload.
pub fn blob_len(data: &[u8]) -> usize {
    4 + aligned(data.len())
}

/// Append a blob: i32 big-endian payload length, the payload, then
/// NUL padding computed on the payload length alone.
pub fn put_blob(buf: &mut BytesMut, data: &[u8]) {
    buf.put_i32(data.len() as i32);
    buf.put_slice(data);
    buf.put_bytes(0, aligned(data.len()) - data.len());
}

/// Read a length-prefixed blob. Returns the payload and the number of
/// bytes consumed (prefix + payload + padding).
pub fn read_blob(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    if data.len() < 4 {
        return Err(Error::BufferTooSmall {
            needed: 4,
            have: data.len(),
        });
    }
    let len = (&data[..4]).get_i32();
    if len < 0 {
        return Err(Error::Parse(format!("negative blob length {len}")));
    }
    let len = len as usize;
    if data.len() - 4 < len {
        return Err(Error::ElementLength {
            claimed: len,
            have: data.len() - 4,
        });
    }
    let payload = data[4..4 + len].to_vec();
    Ok((payload, (4 + aligned(len)).min(data.len())))
}
