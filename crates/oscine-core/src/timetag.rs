//! OSC time tags
//!
//! A time tag is a 64-bit fixed-point number: the high 32 bits count
//! seconds since midnight 1900-01-01, the low 32 bits the fractional
//! second (~233 picoseconds per unit). The value `1` is reserved to
//! mean "immediately".

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, BytesMut};

use crate::{Error, Result};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
pub const SECONDS_1900_TO_1970: u64 = 2_208_988_800;

/// Encoded size of a time tag.
pub const TIMETAG_SIZE: usize = 8;

/// A 64-bit OSC time tag.
///
/// The fractional word carries the raw subsecond nanosecond count in
/// both directions: [`Timetag::from_time`] stores nanoseconds and
/// [`Timetag::time`] reads them back. One fractional unit is ~0.233ns,
/// so the conversion is lossy but symmetric; round trips are exact at
/// whole-second boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timetag(pub u64);

impl Timetag {
    /// The reserved "execute immediately" tag.
    pub const IMMEDIATELY: Timetag = Timetag(1);

    /// Tag for the current wall-clock time.
    pub fn now() -> Self {
        Self::from_time(SystemTime::now())
    }

    /// Convert a wall-clock time to a tag. Times before the Unix
    /// epoch clamp to it.
    pub fn from_time(t: SystemTime) -> Self {
        let since_epoch = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        let secs = SECONDS_1900_TO_1970 + since_epoch.as_secs();
        Timetag((secs << 32) | u64::from(since_epoch.subsec_nanos()))
    }

    /// Convert an optional wall-clock time; `None` stands for
    /// "immediately".
    pub fn from_time_opt(t: Option<SystemTime>) -> Self {
        match t {
            Some(t) => Self::from_time(t),
            None => Self::IMMEDIATELY,
        }
    }

    /// The wall-clock time this tag names, or `None` for the
    /// immediate sentinel.
    pub fn time(self) -> Option<SystemTime> {
        if self.is_immediate() {
            return None;
        }
        let secs = (self.0 >> 32).saturating_sub(SECONDS_1900_TO_1970);
        let nanos = (self.0 & 0xffff_ffff) as u32;
        Some(UNIX_EPOCH + Duration::new(secs, nanos))
    }

    /// True for the reserved immediate tag (and the zero tag, which
    /// no encoder produces).
    pub fn is_immediate(self) -> bool {
        self.0 <= 1
    }

    /// Seconds since 1900-01-01 (high word).
    pub fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Fractional second (low word).
    pub fn fraction(self) -> u32 {
        self.0 as u32
    }

    /// Time remaining until the tag is due. Immediate and past tags
    /// return zero.
    pub fn expires_in(self) -> Duration {
        match self.time() {
            None => Duration::ZERO,
            Some(t) => t
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Append the 8-byte big-endian encoding to `buf`.
    pub fn put(self, buf: &mut BytesMut) {
        buf.put_u64(self.0);
    }

    /// Decode a tag from the first 8 bytes of `data`.
    pub fn read(data: &[u8]) -> Result<Timetag> {
        if data.len() < TIMETAG_SIZE {
            return Err(Error::BufferTooSmall {
                needed: TIMETAG_SIZE,
                have: data.len(),
            });
        }
        Ok(Timetag((&data[..TIMETAG_SIZE]).get_u64()))
    }
}

impl From<SystemTime> for Timetag {
    fn from(t: SystemTime) -> Self {
        Self::from_time(t)
    }
}

impl Default for Timetag {
    fn default() -> Self {
        Self::IMMEDIATELY
    }
}
