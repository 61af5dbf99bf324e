//! Core traits for the block codecs.
//!
//! Both stages of the pipeline implement [`Codec`]. A codec never receives
//! its input directly: it claims buffers of the kind it consumes from the
//! shared [`CodecStream`], writes its output into freshly claimed buffers and
//! releases what it consumed.

use crate::buffer::CodecStream;
use crate::error::Result;
use std::fmt;

/// Identifies a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecType {
    /// Dictionary (hash-chain LZ) stage.
    Lz,
    /// Entropy (per-block Huffman) stage.
    Huffman,
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecType::Lz => f.write_str("LZ"),
            CodecType::Huffman => f.write_str("Huffman"),
        }
    }
}

/// A block codec operating on a shared buffer pool.
pub trait Codec {
    /// Which stage this codec implements.
    fn codec_type(&self) -> CodecType;

    /// Start a new stream (file).
    ///
    /// Resets the running totals and any history carried between blocks.
    fn init_stream(&mut self, stream: &mut CodecStream);

    /// Compress one block.
    ///
    /// # Arguments
    ///
    /// * `stream` - Buffer pool holding the input block
    ///
    /// # Returns
    ///
    /// Number of bytes written to the output buffer(s).
    fn compress_block(&mut self, stream: &mut CodecStream) -> Result<usize>;

    /// Decompress one block.
    ///
    /// # Arguments
    ///
    /// * `stream` - Buffer pool holding the compressed input
    ///
    /// # Returns
    ///
    /// Number of bytes written to the output buffer.
    fn decompress_block(&mut self, stream: &mut CodecStream) -> Result<usize>;

    /// Bytes consumed since the last `init_stream`.
    fn total_in(&self) -> u64;

    /// Bytes produced since the last `init_stream`.
    fn total_out(&self) -> u64;
}

/// Receives progress notifications while a stream is processed.
pub trait ProgressCallback {
    /// Called periodically with the bytes processed so far.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the file being processed
    /// * `bytes_in` - Bytes consumed from the input so far
    /// * `bytes_out` - Bytes produced so far
    /// * `stream_size` - Size of the input stream, if known (0 otherwise)
    fn on_progress(&mut self, name: &str, bytes_in: u64, bytes_out: u64, stream_size: u64);
}

/// A progress callback that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_progress(&mut self, _name: &str, _bytes_in: u64, _bytes_out: u64, _stream_size: u64) {}
}

impl<F> ProgressCallback for F
where
    F: FnMut(&str, u64, u64, u64),
{
    fn on_progress(&mut self, name: &str, bytes_in: u64, bytes_out: u64, stream_size: u64) {
        self(name, bytes_in, bytes_out, stream_size)
    }
}
