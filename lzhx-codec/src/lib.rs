//! # LZHX Codec
//!
//! Pure Rust implementation of the LZHX block codec: a hash-chain LZ stage
//! whose output is split into four tagged streams, each of which is then
//! entropy-coded with a per-block Huffman tree.
//!
//! - [`match_finder`]: Cyclic hash-chain dictionary index
//! - [`lz`]: Greedy LZ parser and its decoder
//! - [`huffman`]: Per-block Huffman tree, codes and serialization
//! - [`pipeline`]: Blocks in, `(u32 length, bytes)` records out
//!
//! ## Example
//!
//! ```rust
//! use lzhx_codec::{compress, decompress};
//!
//! let data = b"Hello, Hello, Hello, LZHX!".repeat(10);
//! let packed = compress(&data).unwrap();
//! assert!(packed.len() < data.len());
//! assert_eq!(decompress(&packed).unwrap(), data);
//! ```
//!
//! ## Custom settings
//!
//! Both sides must use the same [`CodecSettings`]; nothing about them is
//! stored in the compressed data.
//!
//! ```rust
//! use lzhx_codec::BlockPipeline;
//! use lzhx_core::CodecSettings;
//!
//! let settings = CodecSettings::default().with_block_bits(12).with_runs_bits(6);
//! let mut pipeline = BlockPipeline::new(&settings).unwrap();
//! let packed = pipeline.compress(b"abcabcabcabcabcabc").unwrap();
//! assert_eq!(pipeline.decompress(&packed).unwrap(), b"abcabcabcabcabcabc");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod lz;
pub mod match_finder;
pub mod pipeline;

// Re-exports
pub use huffman::{HuffmanCode, HuffmanCodec, HuffmanNode};
pub use lz::{LzCodec, order_streams};
pub use lzhx_core::CodecSettings;
pub use match_finder::{Match, MatchFinder};
pub use pipeline::{BlockPipeline, StreamStats, compress, decompress};
