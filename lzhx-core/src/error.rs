//! Error types for LZHX operations.
//!
//! A single error enum covers the codec layer (buffer capacity violations,
//! corrupt compressed data, invalid settings) as well as the container layer
//! (signatures, headers, integrity hashes, unsafe entry names).

use crate::buffer::BufferKind;
use std::io;
use thiserror::Error;

/// The main error type for LZHX operations.
#[derive(Debug, Error)]
pub enum LzhxError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A write or read went past a buffer's declared capacity.
    #[error("Buffer overrun: need {needed} bytes, capacity is {capacity}")]
    BufferOverrun {
        /// Number of bytes the operation required.
        needed: usize,
        /// Declared capacity of the buffer.
        capacity: usize,
    },

    /// Structurally invalid compressed data.
    #[error("Corrupt stream at offset {offset}: {message}")]
    CorruptStream {
        /// Byte offset (within the current buffer) where the problem was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Invalid codec settings.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the invalid parameter.
        message: String,
    },

    /// No working buffer of the requested kind is available in the pool.
    #[error("No {kind} buffer available in codec stream")]
    BufferUnavailable {
        /// The kind that was requested.
        kind: BufferKind,
    },

    /// Invalid signature in archive header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Invalid header format.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Content hash of an extracted entry does not match the stored hash.
    #[error("Hash mismatch for {name}: expected {expected:#010x}, computed {computed:#010x}")]
    HashMismatch {
        /// Entry name.
        name: String,
        /// Hash stored in the archive.
        expected: u32,
        /// Hash computed from the decompressed data.
        computed: u32,
    },

    /// Path traversal attempt detected in an entry name.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious path.
        path: String,
    },

    /// Entry not found in archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name of the missing entry.
        name: String,
    },
}

/// Result type alias for LZHX operations.
pub type Result<T> = std::result::Result<T, LzhxError>;

impl LzhxError {
    /// Create a buffer overrun error.
    pub fn buffer_overrun(needed: usize, capacity: usize) -> Self {
        Self::BufferOverrun { needed, capacity }
    }

    /// Create a corrupt stream error.
    pub fn corrupt(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptStream {
            offset,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a buffer unavailable error.
    pub fn buffer_unavailable(kind: BufferKind) -> Self {
        Self::BufferUnavailable { kind }
    }

    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a hash mismatch error.
    pub fn hash_mismatch(name: impl Into<String>, expected: u32, computed: u32) -> Self {
        Self::HashMismatch {
            name: name.into(),
            expected,
            computed,
        }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Reinterpret a capacity violation on the read side as stream corruption.
    ///
    /// Decoders read compressed data whose sizes come from the stream itself,
    /// so running off the end of a buffer means the data was truncated or
    /// tampered with. Other errors pass through unchanged.
    pub fn into_corrupt(self, what: &str) -> Self {
        match self {
            Self::BufferOverrun { needed, capacity } => Self::CorruptStream {
                offset: capacity as u64,
                message: format!("truncated {what}: needed {needed} bytes"),
            },
            other => other,
        }
    }

    /// Returns true for errors caused by malformed compressed data.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptStream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LzhxError::invalid_magic(b"LZHX".to_vec(), vec![0x50, 0x4B, 0x03, 0x04]);
        assert!(err.to_string().contains("Invalid magic"));

        let err = LzhxError::hash_mismatch("a.txt", 0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("0x12345678"));
        assert!(err.to_string().contains("a.txt"));

        let err = LzhxError::buffer_unavailable(BufferKind::Lz);
        assert!(err.to_string().contains("LZ"));
    }

    #[test]
    fn test_into_corrupt() {
        let err = LzhxError::buffer_overrun(10, 8).into_corrupt("literal stream");
        assert!(err.is_corrupt());
        assert!(err.to_string().contains("literal stream"));

        let err = LzhxError::configuration("bad").into_corrupt("x");
        assert!(matches!(err, LzhxError::Configuration { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: LzhxError = io_err.into();
        assert!(matches!(err, LzhxError::Io(_)));
    }
}
