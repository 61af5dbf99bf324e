//! Block pipeline: LZ followed by per-stream Huffman.
//!
//! A stream is cut into blocks of `block_capacity` bytes. Each block is
//! split by the LZ stage into four tagged sub-streams, each of which is
//! Huffman-coded on its own and written as a record:
//!
//! ```text
//! block := record record record record
//! record := u32 LE length | Huffman block
//! ```
//!
//! Records carry no block count; the reader needs the total compressed
//! length, which the archive stores per file. An empty stream produces no
//! blocks at all.

use crate::huffman::HuffmanCodec;
use crate::lz::{LzCodec, streams};
use lzhx_core::buffer::BufferKind;
use lzhx_core::error::{LzhxError, Result};
use lzhx_core::{Codec, CodecSettings, CodecStream, NoProgress, ProgressCallback};
use std::io::{ErrorKind, Read, Write};

/// Progress is reported after every this many blocks, and once at the end.
pub const PROGRESS_INTERVAL: u64 = 5;

/// Size of a record's length prefix.
const RECORD_HEADER: u64 = 4;

/// Byte counts for one processed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Bytes consumed from the reader.
    pub bytes_in: u64,
    /// Bytes written to the writer.
    pub bytes_out: u64,
    /// Number of blocks processed.
    pub blocks: u64,
}

impl StreamStats {
    /// Compressed size as a percentage of the uncompressed size.
    pub fn ratio(&self) -> f64 {
        let (packed, unpacked) = if self.bytes_out <= self.bytes_in {
            (self.bytes_out, self.bytes_in)
        } else {
            (self.bytes_in, self.bytes_out)
        };
        if unpacked == 0 {
            0.0
        } else {
            packed as f64 / unpacked as f64 * 100.0
        }
    }
}

/// Owns the working buffers and both codec stages for one stream at a time.
#[derive(Debug, Clone)]
pub struct BlockPipeline {
    settings: CodecSettings,
    stream: CodecStream,
    lz: LzCodec,
    huffman: HuffmanCodec,
}

impl BlockPipeline {
    /// Build a pipeline, rejecting invalid settings.
    pub fn new(settings: &CodecSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: *settings,
            stream: CodecStream::new(settings),
            lz: LzCodec::new(settings)?,
            huffman: HuffmanCodec::new(),
        })
    }

    /// Settings this pipeline was built with.
    pub fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    fn begin_stream(&mut self, stream_size: u64) {
        self.stream.reset();
        self.stream.set_stream_size(stream_size);
        self.lz.init_stream(&mut self.stream);
        self.huffman.init_stream(&mut self.stream);
    }

    /// Compress everything `reader` yields into `writer`.
    ///
    /// # Arguments
    ///
    /// * `reader` - Uncompressed input
    /// * `writer` - Destination for the block records
    /// * `name` - Name passed to `progress`
    /// * `size_hint` - Expected input size for progress reporting (0 if unknown)
    /// * `progress` - Progress receiver
    pub fn compress_stream<R, W, P>(
        &mut self,
        mut reader: R,
        mut writer: W,
        name: &str,
        size_hint: u64,
        progress: &mut P,
    ) -> Result<StreamStats>
    where
        R: Read,
        W: Write,
        P: ProgressCallback + ?Sized,
    {
        self.begin_stream(size_hint);
        let block_capacity = self.settings.block_capacity();
        let mut stats = StreamStats::default();

        loop {
            let raw = self.stream.claim(BufferKind::Empty, BufferKind::Raw)?;
            let buffer = self
                .stream
                .get_mut(raw)
                .ok_or_else(|| LzhxError::buffer_unavailable(BufferKind::Raw))?;
            let filled = read_full(&mut reader, &mut buffer.storage_mut()[..block_capacity])?;
            if filled == 0 {
                buffer.release();
                break;
            }
            buffer.set_size(filled)?;

            self.lz.compress_block(&mut self.stream)?;
            for _ in 0..streams::COUNT {
                self.huffman.compress_block(&mut self.stream)?;
            }

            let mut written = 0u64;
            while let Some(index) = self.stream.find(BufferKind::Hf) {
                let Some(record) = self.stream.get_mut(index) else {
                    break;
                };
                let len = record.size() as u32;
                writer.write_all(&len.to_le_bytes())?;
                writer.write_all(record.data())?;
                written += RECORD_HEADER + u64::from(len);
                record.release();
            }

            stats.blocks += 1;
            stats.bytes_in += filled as u64;
            stats.bytes_out += written;
            log::trace!("{name}: block {} packed {filled} -> {written} bytes", stats.blocks);

            if stats.blocks % PROGRESS_INTERVAL == 0 {
                progress.on_progress(name, stats.bytes_in, stats.bytes_out, size_hint);
            }
            if filled < block_capacity {
                break;
            }
        }

        writer.flush()?;
        progress.on_progress(name, stats.bytes_in, stats.bytes_out, size_hint);
        log::debug!(
            "{name}: compressed {} -> {} bytes in {} blocks",
            stats.bytes_in,
            stats.bytes_out,
            stats.blocks
        );
        Ok(stats)
    }

    /// Decompress exactly `compressed_len` bytes of block records.
    ///
    /// # Errors
    ///
    /// `CorruptStream` if the records are truncated, overrun
    /// `compressed_len`, or exceed the working-buffer capacity.
    pub fn decompress_stream<R, W, P>(
        &mut self,
        mut reader: R,
        mut writer: W,
        compressed_len: u64,
        name: &str,
        progress: &mut P,
    ) -> Result<StreamStats>
    where
        R: Read,
        W: Write,
        P: ProgressCallback + ?Sized,
    {
        self.begin_stream(compressed_len);
        let capacity = self.settings.buffer_capacity();
        let mut stats = StreamStats::default();

        while stats.bytes_in < compressed_len {
            for _ in 0..streams::COUNT {
                if stats.bytes_in + RECORD_HEADER > compressed_len {
                    return Err(LzhxError::corrupt(stats.bytes_in, "record header past end of data"));
                }
                let mut header = [0u8; RECORD_HEADER as usize];
                read_exact_or_corrupt(&mut reader, &mut header, stats.bytes_in)?;
                stats.bytes_in += RECORD_HEADER;

                let len = u32::from_le_bytes(header) as usize;
                if len > capacity {
                    return Err(LzhxError::corrupt(
                        stats.bytes_in,
                        format!("record of {len} bytes exceeds buffer capacity {capacity}"),
                    ));
                }
                if stats.bytes_in + len as u64 > compressed_len {
                    return Err(LzhxError::corrupt(stats.bytes_in, "record runs past end of data"));
                }

                let slot = self.stream.claim(BufferKind::Empty, BufferKind::Hf)?;
                let record = self
                    .stream
                    .get_mut(slot)
                    .ok_or_else(|| LzhxError::buffer_unavailable(BufferKind::Hf))?;
                read_exact_or_corrupt(&mut reader, &mut record.storage_mut()[..len], stats.bytes_in)?;
                record.set_size(len)?;
                stats.bytes_in += len as u64;
            }

            for _ in 0..streams::COUNT {
                self.huffman.decompress_block(&mut self.stream)?;
            }
            let produced = self.lz.decompress_block(&mut self.stream)?;

            let raw = self
                .stream
                .find_mut(BufferKind::Raw)
                .ok_or_else(|| LzhxError::buffer_unavailable(BufferKind::Raw))?;
            writer.write_all(raw.data())?;
            raw.release();

            stats.blocks += 1;
            stats.bytes_out += produced as u64;
            log::trace!("{name}: block {} unpacked to {produced} bytes", stats.blocks);

            if stats.blocks % PROGRESS_INTERVAL == 0 {
                progress.on_progress(name, stats.bytes_in, stats.bytes_out, compressed_len);
            }
        }

        writer.flush()?;
        progress.on_progress(name, stats.bytes_in, stats.bytes_out, compressed_len);
        log::debug!(
            "{name}: decompressed {} -> {} bytes in {} blocks",
            stats.bytes_in,
            stats.bytes_out,
            stats.blocks
        );
        Ok(stats)
    }

    /// Compress a byte slice.
    pub fn compress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() / 2 + 64);
        self.compress_stream(input, &mut output, "", input.len() as u64, &mut NoProgress)?;
        Ok(output)
    }

    /// Decompress a byte slice produced by [`compress`](Self::compress).
    pub fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 2);
        self.decompress_stream(input, &mut output, input.len() as u64, "", &mut NoProgress)?;
        Ok(output)
    }
}

/// Compress `input` with default settings.
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    BlockPipeline::new(&CodecSettings::default())?.compress(input)
}

/// Decompress `input` with default settings.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    BlockPipeline::new(&CodecSettings::default())?.decompress(input)
}

/// Fill `buf` from `reader`, stopping early only at end of input.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

fn read_exact_or_corrupt<R: Read>(reader: &mut R, buf: &mut [u8], offset: u64) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            LzhxError::corrupt(offset, "unexpected end of compressed data")
        } else {
            e.into()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A reader handing out at most three bytes per call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(3).min(self.0.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    fn small_settings() -> CodecSettings {
        CodecSettings::default()
            .with_block_bits(8)
            .with_match_pos_bits(8)
            .with_lookup_bits(10)
            .with_hash_len(3)
    }

    #[test]
    fn test_empty_stream_has_no_blocks() {
        let mut pipeline = BlockPipeline::new(&CodecSettings::default()).unwrap();
        let packed = pipeline.compress(b"").unwrap();
        assert!(packed.is_empty());
        assert!(pipeline.decompress(&packed).unwrap().is_empty());
    }

    #[test]
    fn test_single_block_records() {
        let input = b"a block with a block with a block inside".to_vec();
        let packed = compress(&input).unwrap();

        // Four records, each starting with a Huffman size header.
        let mut offset = 0;
        for _ in 0..4 {
            let len = u32::from_le_bytes(packed[offset..offset + 4].try_into().unwrap()) as usize;
            offset += 4 + len;
        }
        assert_eq!(offset, packed.len());
        assert_eq!(decompress(&packed).unwrap(), input);
    }

    #[test]
    fn test_short_reads_fill_blocks() {
        let settings = small_settings();
        let input: Vec<u8> = b"short reads still fill whole blocks. ".repeat(30);

        let mut chunked = Vec::new();
        let stats = BlockPipeline::new(&settings)
            .unwrap()
            .compress_stream(Trickle(&input), &mut chunked, "t", 0, &mut NoProgress)
            .unwrap();
        assert_eq!(stats.blocks, input.len().div_ceil(256) as u64);

        let direct = BlockPipeline::new(&settings).unwrap().compress(&input).unwrap();
        assert_eq!(chunked, direct);
    }

    #[test]
    fn test_progress_cadence() {
        let settings = small_settings();
        let input = vec![7u8; 256 * 12];
        let mut calls = Vec::new();
        let mut progress = |_: &str, bytes_in: u64, _: u64, total: u64| calls.push((bytes_in, total));

        BlockPipeline::new(&settings)
            .unwrap()
            .compress_stream(&input[..], std::io::sink(), "p", input.len() as u64, &mut progress)
            .unwrap();

        // Blocks 5 and 10, then the final report.
        assert_eq!(
            calls,
            vec![(256 * 5, 3072), (256 * 10, 3072), (3072, 3072)]
        );
    }

    #[test]
    fn test_truncated_records_are_corrupt() {
        let input = b"truncation must be detected, truncation must be detected".to_vec();
        let packed = compress(&input).unwrap();

        for cut in [1, 4, 6, packed.len() - 1] {
            let err = decompress(&packed[..cut]).unwrap_err();
            assert!(err.is_corrupt(), "cut at {cut}: {err}");
        }
    }

    #[test]
    fn test_declared_length_shorter_than_records() {
        let packed = compress(b"declared length check, declared length check").unwrap();
        let mut pipeline = BlockPipeline::new(&CodecSettings::default()).unwrap();
        let err = pipeline
            .decompress_stream(&packed[..], std::io::sink(), packed.len() as u64 - 3, "", &mut NoProgress)
            .unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_oversized_record_is_corrupt() {
        let mut packed = vec![0xFF, 0xFF, 0xFF, 0x7F];
        packed.extend_from_slice(&[0u8; 32]);
        assert!(decompress(&packed).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = CodecSettings::default().with_buffer_bits(1);
        assert!(matches!(
            BlockPipeline::new(&settings),
            Err(LzhxError::Configuration { .. })
        ));
    }

    #[test]
    fn test_stats_ratio() {
        let stats = StreamStats {
            bytes_in: 200,
            bytes_out: 50,
            blocks: 1,
        };
        assert!((stats.ratio() - 25.0).abs() < f64::EPSILON);
        assert_eq!(StreamStats::default().ratio(), 0.0);
    }
}
