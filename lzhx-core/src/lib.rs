//! # LZHX Core
//!
//! Core components for the LZHX archiver.
//!
//! This crate provides the building blocks shared by the codecs and the
//! container:
//!
//! - [`bitstream`]: Bit-level I/O over byte slices (Huffman codes and trees)
//! - [`bytes`]: Little-endian integer packing
//! - [`dictionary`]: Ring buffer holding the LZ history window
//! - [`hash`]: FNV-1a hashing
//! - [`buffer`]: Working buffer pool passed between codec stages
//! - [`settings`]: Bit-width codec configuration
//! - [`traits`]: The `Codec` and `ProgressCallback` traits
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     lzhx create / extract / list / test / auto          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container                                           │
//! │     LZHX archive header, file headers, FNV check        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Hash-chain LZ (4 streams) -> per-block Huffman      │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Primitives (this crate)                             │
//! │     BitWriter/BitReader, DictionaryBuffer, CodecStream  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lzhx_core::bitstream::{BitReader, BitWriter};
//! use lzhx_core::hash::Fnv1a;
//!
//! let mut buf = [0u8; 2];
//! let mut writer = BitWriter::new(&mut buf);
//! writer.write_bits(0xABC, 12).unwrap();
//!
//! let mut reader = BitReader::new(&buf);
//! assert_eq!(reader.read_bits(12).unwrap(), 0xABC);
//!
//! assert_eq!(Fnv1a::compute(b"a"), 0xE40C292C);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod buffer;
pub mod bytes;
pub mod dictionary;
pub mod error;
pub mod hash;
pub mod settings;
pub mod traits;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use buffer::{BufferKind, CodecBuffer, CodecStream};
pub use bytes::{ByteReader, ByteWriter, read_u16_le, read_u32_le, write_u16_le, write_u32_le};
pub use dictionary::DictionaryBuffer;
pub use error::{LzhxError, Result};
pub use hash::Fnv1a;
pub use settings::CodecSettings;
pub use traits::{Codec, CodecType, NoProgress, ProgressCallback};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::buffer::{BufferKind, CodecStream};
    pub use crate::error::{LzhxError, Result};
    pub use crate::settings::CodecSettings;
    pub use crate::traits::{Codec, CodecType, ProgressCallback};
}
