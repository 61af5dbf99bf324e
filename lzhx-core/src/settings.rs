//! Codec configuration.
//!
//! Every size is configured as a bit width; byte sizes and masks are derived
//! as `1 << bits` and `(1 << bits) - 1`. Settings are validated once and then
//! shared by reference with every codec of a pipeline. Compressor and
//! decompressor must use identical settings.

use crate::error::{LzhxError, Result};
use std::fmt;

/// Default and limit values for [`CodecSettings`].
pub mod constants {
    /// Default block size: 64 KiB.
    pub const DEFAULT_BLOCK_BITS: u8 = 16;
    /// Default lookup table: 64 Ki buckets.
    pub const DEFAULT_LOOKUP_BITS: u8 = 16;
    /// Default hash prefix length in bytes.
    pub const DEFAULT_HASH_LEN: usize = 5;
    /// Default match length width (one-byte length field).
    pub const DEFAULT_MATCH_LEN_BITS: u8 = 8;
    /// Default match window: 64 KiB.
    pub const DEFAULT_MATCH_POS_BITS: u8 = 16;
    /// Default working buffer pool: 8 buffers.
    pub const DEFAULT_BUFFER_BITS: u8 = 3;
    /// Default chain walk limit: 8 nodes.
    pub const DEFAULT_RUNS_BITS: u8 = 3;
    /// Default minimum match; matches must be strictly longer.
    pub const DEFAULT_MIN_MATCH: usize = 4;

    /// Largest block. Keeps Huffman code lengths within 32 bits.
    pub const MAX_BLOCK_BITS: u8 = 20;
    /// Smallest block.
    pub const MIN_BLOCK_BITS: u8 = 4;
    /// Largest lookup table.
    pub const MAX_LOOKUP_BITS: u8 = 24;
    /// Largest match length width (the length travels in one byte).
    pub const MAX_MATCH_LEN_BITS: u8 = 8;
    /// Smallest window; below this every match would be a short match.
    pub const MIN_MATCH_POS_BITS: u8 = 8;
    /// Largest window (long match positions travel in two bytes).
    pub const MAX_MATCH_POS_BITS: u8 = 16;
    /// Smallest pool: one raw buffer, four LZ buffers and one Huffman buffer.
    pub const MIN_BUFFER_BITS: u8 = 3;
    /// Largest pool.
    pub const MAX_BUFFER_BITS: u8 = 6;
    /// Largest chain walk limit.
    pub const MAX_RUNS_BITS: u8 = 10;
    /// Extra working-buffer room beyond twice the block size.
    pub const BUFFER_SLACK: usize = 1024;
}

use constants::*;

/// Bit-width configuration of the LZ and Huffman stages.
///
/// # Example
///
/// ```
/// use lzhx_core::CodecSettings;
///
/// let settings = CodecSettings::default().with_block_bits(12).with_runs_bits(5);
/// settings.validate().unwrap();
/// assert_eq!(settings.block_capacity(), 4096);
/// assert_eq!(settings.run_limit(), 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSettings {
    block_bits: u8,
    lookup_bits: u8,
    hash_len: usize,
    match_len_bits: u8,
    match_pos_bits: u8,
    buffer_bits: u8,
    runs_bits: u8,
    min_match: usize,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            block_bits: DEFAULT_BLOCK_BITS,
            lookup_bits: DEFAULT_LOOKUP_BITS,
            hash_len: DEFAULT_HASH_LEN,
            match_len_bits: DEFAULT_MATCH_LEN_BITS,
            match_pos_bits: DEFAULT_MATCH_POS_BITS,
            buffer_bits: DEFAULT_BUFFER_BITS,
            runs_bits: DEFAULT_RUNS_BITS,
            min_match: DEFAULT_MIN_MATCH,
        }
    }
}

impl CodecSettings {
    /// Set the block size as a bit width.
    pub fn with_block_bits(mut self, bits: u8) -> Self {
        self.block_bits = bits;
        self
    }

    /// Set the lookup table size as a bit width.
    pub fn with_lookup_bits(mut self, bits: u8) -> Self {
        self.lookup_bits = bits;
        self
    }

    /// Set the hash prefix length as a bit width (`1 << bits` bytes).
    pub fn with_hash_bits(mut self, bits: u8) -> Self {
        self.hash_len = 1usize.checked_shl(u32::from(bits)).unwrap_or(0);
        self
    }

    /// Set the hash prefix length directly in bytes.
    pub fn with_hash_len(mut self, len: usize) -> Self {
        self.hash_len = len;
        self
    }

    /// Set the maximum match length as a bit width.
    pub fn with_match_len_bits(mut self, bits: u8) -> Self {
        self.match_len_bits = bits;
        self
    }

    /// Set the match window as a bit width.
    pub fn with_match_pos_bits(mut self, bits: u8) -> Self {
        self.match_pos_bits = bits;
        self
    }

    /// Set the working buffer count as a bit width.
    pub fn with_buffer_bits(mut self, bits: u8) -> Self {
        self.buffer_bits = bits;
        self
    }

    /// Set the chain walk limit as a bit width.
    pub fn with_runs_bits(mut self, bits: u8) -> Self {
        self.runs_bits = bits;
        self
    }

    /// Set the minimum match length; only longer matches are emitted.
    pub fn with_min_match(mut self, len: usize) -> Self {
        self.min_match = len;
        self
    }

    /// Check every parameter against its limits.
    pub fn validate(&self) -> Result<()> {
        check_range("block", self.block_bits, MIN_BLOCK_BITS, MAX_BLOCK_BITS)?;
        check_range("lookup", self.lookup_bits, 1, MAX_LOOKUP_BITS)?;
        check_range("match length", self.match_len_bits, 1, MAX_MATCH_LEN_BITS)?;
        check_range(
            "match position",
            self.match_pos_bits,
            MIN_MATCH_POS_BITS,
            MAX_MATCH_POS_BITS,
        )?;
        check_range("buffer count", self.buffer_bits, MIN_BUFFER_BITS, MAX_BUFFER_BITS)?;
        check_range("runs", self.runs_bits, 0, MAX_RUNS_BITS)?;

        if self.hash_len == 0 {
            return Err(LzhxError::configuration("hash prefix length must be nonzero"));
        }
        if self.hash_len >= self.block_capacity() || self.hash_len >= self.window_size() {
            return Err(LzhxError::configuration(format!(
                "hash prefix length {} must be smaller than block ({}) and window ({})",
                self.hash_len,
                self.block_capacity(),
                self.window_size()
            )));
        }
        if self.min_match >= self.max_match_len() {
            return Err(LzhxError::configuration(format!(
                "minimum match {} leaves no room below maximum match {}",
                self.min_match,
                self.max_match_len()
            )));
        }
        Ok(())
    }

    /// Block size in bytes.
    pub fn block_capacity(&self) -> usize {
        1 << self.block_bits
    }

    /// Block size mask.
    pub fn block_mask(&self) -> usize {
        self.block_capacity() - 1
    }

    /// Number of lookup table buckets.
    pub fn lookup_capacity(&self) -> usize {
        1 << self.lookup_bits
    }

    /// Mask applied to prefix hashes.
    pub fn lookup_mask(&self) -> usize {
        self.lookup_capacity() - 1
    }

    /// Hash prefix length in bytes.
    pub fn hash_len(&self) -> usize {
        self.hash_len
    }

    /// Longest match the encoder emits (the match length mask).
    pub fn max_match_len(&self) -> usize {
        (1 << self.match_len_bits) - 1
    }

    /// Dictionary window (and node arena) size.
    pub fn window_size(&self) -> usize {
        1 << self.match_pos_bits
    }

    /// Dictionary window mask.
    pub fn window_mask(&self) -> usize {
        self.window_size() - 1
    }

    /// Number of working buffers in a codec stream.
    pub fn buffer_count(&self) -> usize {
        1 << self.buffer_bits
    }

    /// Maximum number of chain nodes visited per search.
    pub fn run_limit(&self) -> usize {
        1 << self.runs_bits
    }

    /// Matches must be strictly longer than this.
    pub fn min_match(&self) -> usize {
        self.min_match
    }

    /// Capacity of each working buffer.
    pub fn buffer_capacity(&self) -> usize {
        2 * self.block_capacity() + BUFFER_SLACK
    }
}

fn check_range(name: &str, bits: u8, min: u8, max: u8) -> Result<()> {
    if bits < min || bits > max {
        return Err(LzhxError::configuration(format!(
            "{name} bits {bits} outside {min}..={max}"
        )));
    }
    Ok(())
}

impl fmt::Display for CodecSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block={} lookup={} hash={} match_len={} window={} buffers={} runs={} min_match={}",
            self.block_capacity(),
            self.lookup_capacity(),
            self.hash_len,
            self.max_match_len(),
            self.window_size(),
            self.buffer_count(),
            self.run_limit(),
            self.min_match
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CodecSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.block_capacity(), 65536);
        assert_eq!(settings.block_mask(), 0xFFFF);
        assert_eq!(settings.lookup_capacity(), 65536);
        assert_eq!(settings.hash_len(), 5);
        assert_eq!(settings.max_match_len(), 255);
        assert_eq!(settings.window_size(), 65536);
        assert_eq!(settings.buffer_count(), 8);
        assert_eq!(settings.run_limit(), 8);
        assert_eq!(settings.min_match(), 4);
        assert_eq!(settings.buffer_capacity(), 2 * 65536 + BUFFER_SLACK);
    }

    #[test]
    fn test_hash_bits() {
        let settings = CodecSettings::default().with_hash_bits(2);
        assert_eq!(settings.hash_len(), 4);
        settings.validate().unwrap();
    }

    #[test]
    fn test_rejects_out_of_range() {
        let cases = [
            CodecSettings::default().with_block_bits(21),
            CodecSettings::default().with_block_bits(0),
            CodecSettings::default().with_lookup_bits(0),
            CodecSettings::default().with_match_len_bits(9),
            CodecSettings::default().with_match_pos_bits(17),
            CodecSettings::default().with_match_pos_bits(7),
            CodecSettings::default().with_buffer_bits(2),
            CodecSettings::default().with_runs_bits(11),
            CodecSettings::default().with_hash_len(0),
            CodecSettings::default().with_min_match(255),
        ];
        for settings in cases {
            let err = settings.validate().unwrap_err();
            assert!(
                matches!(err, LzhxError::Configuration { .. }),
                "{settings} accepted"
            );
        }
    }

    #[test]
    fn test_hash_must_fit_block() {
        let settings = CodecSettings::default()
            .with_block_bits(4)
            .with_hash_len(16);
        assert!(settings.validate().is_err());

        let settings = CodecSettings::default()
            .with_block_bits(4)
            .with_hash_len(15);
        settings.validate().unwrap();
    }

    #[test]
    fn test_display() {
        let text = CodecSettings::default().to_string();
        assert!(text.contains("block=65536"));
        assert!(text.contains("hash=5"));
    }
}
