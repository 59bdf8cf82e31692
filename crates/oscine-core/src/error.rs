//! Error types for the OSC codec

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// OSC codec error types
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized or misplaced typetag byte
    #[error("invalid typetag: 0x{0:02x}")]
    InvalidTypeTag(u8),

    /// Input ended before a fixed-size field
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall { needed: usize, have: usize },

    /// Malformed packet
    #[error("parse error: {0}")]
    Parse(String),

    /// Bundle did not start with the `#bundle` OSC-string
    #[error("invalid bundle tag: expected {expected:?}, got {actual:?}")]
    InvalidBundleTag { expected: Vec<u8>, actual: Vec<u8> },

    /// A length prefix claimed more bytes than remain
    #[error("element claims {claimed} bytes, only {have} remain")]
    ElementLength { claimed: usize, have: usize },

    /// Bundle nesting exceeded [`crate::MAX_BUNDLE_DEPTH`]
    #[error("bundle nested deeper than {0} levels")]
    BundleTooDeep(usize),

    /// Argument decode failure, with its zero-based index
    #[error("argument {index}: {source}")]
    Argument {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Bundle element decode failure, with its zero-based index
    #[error("bundle element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Address contains characters disallowed for literal handler keys
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Address pattern failed to compile
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Argument index past the end of the argument list
    #[error("argument index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A nested bundle's timetag precedes its enclosing bundle's
    #[error("nested bundle timetag precedes its parent's")]
    EarlyTimetag,
}
