//! Hash-chain LZ stage.
//!
//! Each block is parsed greedily into four byte streams:
//!
//! | tag | stream      | contents                                            |
//! |-----|-------------|-----------------------------------------------------|
//! | 0   | instruction | literal bytes, or an opcode for matches and escapes |
//! | 1   | position    | `u32` block length, then match distances            |
//! | 2   | length      | match lengths, one byte each                        |
//! | 3   | literal     | literals whose value collides with an opcode        |
//!
//! Every stream starts with its tag byte so the decoder can put them back in
//! order however they were stored. Match distances are measured backwards
//! from the dictionary write cursor; distances below 256 take the one-byte
//! short form.
//!
//! The dictionary and the match finder persist across blocks and are reset
//! only by [`Codec::init_stream`].

use crate::match_finder::{Match, MatchFinder};
use lzhx_core::buffer::BufferKind;
use lzhx_core::bytes::{ByteReader, ByteWriter};
use lzhx_core::error::{LzhxError, Result};
use lzhx_core::{Codec, CodecSettings, CodecStream, CodecType, DictionaryBuffer};

/// Sub-stream tags.
pub mod streams {
    /// Literals and opcodes.
    pub const INSTRUCTION: usize = 0;
    /// Block length and match distances.
    pub const POSITION: usize = 1;
    /// Match lengths.
    pub const LENGTH: usize = 2;
    /// Escaped literals.
    pub const LITERAL: usize = 3;
    /// Number of sub-streams per block.
    pub const COUNT: usize = 4;
    /// Fixed bytes per block: four tags plus the block length.
    pub const HEADER_BYTES: usize = COUNT + 4;
}

/// Reserved instruction-stream values.
pub mod opcodes {
    /// Match with a one-byte distance.
    pub const SHORT_MATCH: u8 = 0;
    /// Match with a two-byte distance.
    pub const LONG_MATCH: u8 = 1;
    /// Next literal is in the literal stream.
    pub const LITERAL_ESCAPE: u8 = 2;

    /// True if `byte` cannot travel inline in the instruction stream.
    #[inline]
    pub fn is_reserved(byte: u8) -> bool {
        byte <= LITERAL_ESCAPE
    }
}

use streams::{INSTRUCTION, LENGTH, LITERAL, POSITION};

/// LZ encoder/decoder with cross-block history.
#[derive(Debug, Clone)]
pub struct LzCodec {
    finder: MatchFinder,
    dictionary: DictionaryBuffer,
    /// Bytes of the current match, copied out before they are re-appended.
    staging: Vec<u8>,
    hash_len: usize,
    min_match: usize,
    window_size: usize,
    total_in: u64,
    total_out: u64,
}

impl LzCodec {
    /// Create a codec for `settings`.
    ///
    /// Fails with `Configuration` if the settings do not validate.
    pub fn new(settings: &CodecSettings) -> Result<Self> {
        Ok(Self {
            finder: MatchFinder::new(settings)?,
            dictionary: DictionaryBuffer::new(settings.window_size()),
            staging: vec![0; usize::from(u8::MAX) + 1],
            hash_len: settings.hash_len(),
            min_match: settings.min_match(),
            window_size: settings.window_size(),
            total_in: 0,
            total_out: 0,
        })
    }

    /// Forget all history and totals.
    pub fn reset(&mut self) {
        self.finder.reset();
        self.dictionary.clear();
        self.total_in = 0;
        self.total_out = 0;
    }

    /// Encode `input` into the four stream buffers.
    ///
    /// `outputs` are indexed by stream tag. Returns the number of bytes
    /// written to each.
    pub fn encode_block(&mut self, input: &[u8], outputs: [&mut [u8]; 4]) -> Result<[usize; 4]> {
        let block_len = u32::try_from(input.len())
            .map_err(|_| LzhxError::configuration("block longer than 4 GiB"))?;
        let mut out = outputs.map(ByteWriter::new);
        for (tag, stream) in out.iter_mut().enumerate() {
            stream.put_u8(tag as u8)?;
        }
        out[POSITION].put_u32_le(block_len)?;

        let n = input.len();
        let mut i = 0;
        while i < n {
            let found = if i + self.hash_len > n {
                Match::default()
            } else {
                self.finder.find(input, i, &self.dictionary)
            };

            if found.length > self.min_match && found.position + found.length + self.hash_len < n
            {
                let distance = self.dictionary.to_relative(found.position);
                if let Ok(short) = u8::try_from(distance) {
                    out[INSTRUCTION].put_u8(opcodes::SHORT_MATCH)?;
                    out[POSITION].put_u8(short)?;
                } else {
                    out[INSTRUCTION].put_u8(opcodes::LONG_MATCH)?;
                    out[POSITION].put_u16_le(distance as u16)?;
                }
                out[LENGTH].put_u8(found.length as u8)?;

                for _ in 0..found.length {
                    self.advance(input, i);
                    i += 1;
                }
            } else {
                let byte = input[i];
                if opcodes::is_reserved(byte) {
                    out[INSTRUCTION].put_u8(opcodes::LITERAL_ESCAPE)?;
                    out[LITERAL].put_u8(byte)?;
                } else {
                    out[INSTRUCTION].put_u8(byte)?;
                }
                self.advance(input, i);
                i += 1;
            }
        }

        let sizes = out.map(|stream| stream.position());
        self.total_in += n as u64;
        self.total_out += sizes.iter().sum::<usize>() as u64;
        Ok(sizes)
    }

    /// Index and append the byte at `input[i]`.
    #[inline]
    fn advance(&mut self, input: &[u8], i: usize) {
        self.finder.insert(input, i, &self.dictionary);
        self.dictionary.put_byte(input[i]);
    }

    /// Decode four stream buffers, given in any order, into `output`.
    ///
    /// Returns the block length.
    pub fn decode_block(&mut self, inputs: [&[u8]; 4], output: &mut [u8]) -> Result<usize> {
        let ordered = order_streams(inputs)?;
        let mut input = ordered.map(|stream| {
            let mut reader = ByteReader::new(stream);
            // Tag presence was checked while ordering.
            let _ = reader.get_u8();
            reader
        });

        let block_len = input[POSITION]
            .get_u32_le()
            .map_err(|e| e.into_corrupt("position stream"))? as usize;
        if block_len > output.len() {
            return Err(LzhxError::corrupt(
                1,
                format!(
                    "block length {block_len} exceeds buffer capacity {}",
                    output.len()
                ),
            ));
        }

        let mut o = 0;
        while o < block_len {
            let instruction = input[INSTRUCTION]
                .get_u8()
                .map_err(|e| e.into_corrupt("instruction stream"))?;

            match instruction {
                opcodes::SHORT_MATCH | opcodes::LONG_MATCH => {
                    let distance = if instruction == opcodes::SHORT_MATCH {
                        input[POSITION].get_u8().map(usize::from)
                    } else {
                        input[POSITION].get_u16_le().map(usize::from)
                    }
                    .map_err(|e| e.into_corrupt("position stream"))?;
                    let length = usize::from(
                        input[LENGTH]
                            .get_u8()
                            .map_err(|e| e.into_corrupt("length stream"))?,
                    );

                    if distance >= self.window_size {
                        return Err(LzhxError::corrupt(
                            input[POSITION].position() as u64,
                            format!("match distance {distance} outside window"),
                        ));
                    }
                    if o + length > block_len {
                        return Err(LzhxError::corrupt(
                            input[LENGTH].position() as u64,
                            format!("match of {length} bytes overruns block of {block_len}"),
                        ));
                    }

                    let start = self.dictionary.to_absolute(distance);
                    for j in 0..length {
                        let byte = self.dictionary.get_byte(start + j);
                        self.staging[j] = byte;
                        output[o + j] = byte;
                    }
                    for &byte in &self.staging[..length] {
                        self.dictionary.put_byte(byte);
                    }
                    o += length;
                }
                opcodes::LITERAL_ESCAPE => {
                    let byte = input[LITERAL]
                        .get_u8()
                        .map_err(|e| e.into_corrupt("literal stream"))?;
                    self.dictionary.put_byte(byte);
                    output[o] = byte;
                    o += 1;
                }
                byte => {
                    self.dictionary.put_byte(byte);
                    output[o] = byte;
                    o += 1;
                }
            }
        }

        self.total_in += input.iter().map(|r| r.position() as u64).sum::<u64>();
        self.total_out += block_len as u64;
        Ok(block_len)
    }
}

/// Sort four tagged streams into tag order.
///
/// Each stream must start with a distinct tag in `0..4`.
pub fn order_streams(inputs: [&[u8]; 4]) -> Result<[&[u8]; 4]> {
    let mut ordered: [Option<&[u8]>; 4] = [None; 4];
    for stream in inputs {
        let tag = *stream
            .first()
            .ok_or_else(|| LzhxError::corrupt(0, "empty LZ stream"))?;
        let slot = ordered
            .get_mut(usize::from(tag))
            .ok_or_else(|| LzhxError::corrupt(0, format!("unknown LZ stream tag {tag}")))?;
        if slot.is_some() {
            return Err(LzhxError::corrupt(0, format!("duplicate LZ stream tag {tag}")));
        }
        *slot = Some(stream);
    }

    // Four distinct tags below four fill every slot.
    let [Some(a), Some(b), Some(c), Some(d)] = ordered else {
        return Err(LzhxError::corrupt(0, "missing LZ stream"));
    };
    Ok([a, b, c, d])
}

impl Codec for LzCodec {
    fn codec_type(&self) -> CodecType {
        CodecType::Lz
    }

    fn init_stream(&mut self, _stream: &mut CodecStream) {
        self.reset();
    }

    fn compress_block(&mut self, stream: &mut CodecStream) -> Result<usize> {
        let raw = stream
            .find(BufferKind::Raw)
            .ok_or_else(|| LzhxError::buffer_unavailable(BufferKind::Raw))?;
        let mut slots = [0usize; 4];
        for slot in &mut slots {
            *slot = stream.claim(BufferKind::Empty, BufferKind::Lz)?;
        }

        let [input, s0, s1, s2, s3] = stream.many_mut([raw, slots[0], slots[1], slots[2], slots[3]])?;
        let sizes = self.encode_block(
            input.data(),
            [
                s0.storage_mut(),
                s1.storage_mut(),
                s2.storage_mut(),
                s3.storage_mut(),
            ],
        )?;
        for (buffer, size) in [s0, s1, s2, s3].into_iter().zip(sizes) {
            buffer.set_size(size)?;
        }
        input.release();

        Ok(sizes.iter().sum())
    }

    fn decompress_block(&mut self, stream: &mut CodecStream) -> Result<usize> {
        let out = stream.claim(BufferKind::Empty, BufferKind::Raw)?;
        let mut slots = [0usize; 4];
        for slot in &mut slots {
            *slot = stream.claim(BufferKind::Lz, BufferKind::Empty)?;
        }

        let [output, s0, s1, s2, s3] = stream.many_mut([out, slots[0], slots[1], slots[2], slots[3]])?;
        let produced = self.decode_block(
            [s0.data(), s1.data(), s2.data(), s3.data()],
            output.storage_mut(),
        )?;
        output.set_size(produced)?;
        for buffer in [s0, s1, s2, s3] {
            buffer.release();
        }

        Ok(produced)
    }

    fn total_in(&self) -> u64 {
        self.total_in
    }

    fn total_out(&self) -> u64 {
        self.total_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_settings() -> CodecSettings {
        CodecSettings::default()
            .with_lookup_bits(12)
            .with_match_pos_bits(12)
    }

    fn encode(codec: &mut LzCodec, input: &[u8]) -> Vec<Vec<u8>> {
        let capacity = 2 * input.len() + 16;
        let mut buffers = vec![vec![0u8; capacity]; 4];
        let sizes = {
            let [a, b, c, d] = &mut buffers[..] else {
                unreachable!()
            };
            codec
                .encode_block(
                    input,
                    [
                        a.as_mut_slice(),
                        b.as_mut_slice(),
                        c.as_mut_slice(),
                        d.as_mut_slice(),
                    ],
                )
                .unwrap()
        };
        buffers
            .into_iter()
            .zip(sizes)
            .map(|(mut buffer, size)| {
                buffer.truncate(size);
                buffer
            })
            .collect()
    }

    fn decode(codec: &mut LzCodec, streams: &[Vec<u8>], capacity: usize) -> Result<Vec<u8>> {
        let mut output = vec![0u8; capacity];
        let n = codec.decode_block(
            [
                streams[0].as_slice(),
                streams[1].as_slice(),
                streams[2].as_slice(),
                streams[3].as_slice(),
            ],
            &mut output,
        )?;
        output.truncate(n);
        Ok(output)
    }

    fn roundtrip(settings: &CodecSettings, input: &[u8]) {
        let mut encoder = LzCodec::new(settings).unwrap();
        let mut decoder = LzCodec::new(settings).unwrap();
        let streams = encode(&mut encoder, input);
        let decoded = decode(&mut decoder, &streams, input.len() + 1).unwrap();
        assert_eq!(decoded, input);
    }

    fn count_matches(streams: &[Vec<u8>]) -> usize {
        // One length byte per match, after the tag.
        streams[LENGTH].len() - 1
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = CodecSettings::default().with_match_pos_bits(64);
        assert!(matches!(
            LzCodec::new(&settings),
            Err(LzhxError::Configuration { .. })
        ));
        assert!(LzCodec::new(&small_settings()).is_ok());
    }

    #[test]
    fn test_stream_headers() {
        let mut codec = LzCodec::new(&small_settings()).unwrap();
        let streams = encode(&mut codec, b"hi");
        assert_eq!(streams[0], vec![0, b'h', b'i']);
        assert_eq!(streams[1], vec![1, 2, 0, 0, 0]);
        assert_eq!(streams[2], vec![2]);
        assert_eq!(streams[3], vec![3]);
    }

    #[test]
    fn test_empty_block() {
        roundtrip(&small_settings(), b"");
    }

    #[test]
    fn test_reserved_bytes_are_escaped() {
        let mut codec = LzCodec::new(&small_settings()).unwrap();
        let streams = encode(&mut codec, &[0, 1, 2, 3]);
        assert_eq!(
            streams[INSTRUCTION],
            vec![
                0,
                opcodes::LITERAL_ESCAPE,
                opcodes::LITERAL_ESCAPE,
                opcodes::LITERAL_ESCAPE,
                3
            ]
        );
        assert_eq!(streams[LITERAL], vec![3, 0, 1, 2]);
        roundtrip(&small_settings(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_abab_emits_match() {
        let settings = small_settings().with_min_match(3);
        let input = b"abababababab";
        let mut codec = LzCodec::new(&settings).unwrap();
        let streams = encode(&mut codec, input);

        assert!(count_matches(&streams) >= 1);
        let payload: usize = streams.iter().map(Vec::len).sum::<usize>() - streams::HEADER_BYTES;
        assert!(payload < input.len());

        roundtrip(&settings, input);
    }

    #[test]
    fn test_distinct_bytes_are_all_literals() {
        let input: Vec<u8> = (0..=255).collect();
        let mut codec = LzCodec::new(&small_settings()).unwrap();
        let streams = encode(&mut codec, &input);

        assert_eq!(count_matches(&streams), 0);
        assert_eq!(streams[POSITION].len(), 5);
        roundtrip(&small_settings(), &input);
    }

    #[test]
    fn test_block_shorter_than_hash() {
        let settings = small_settings();
        let input = b"aaaa";
        assert!(input.len() < settings.hash_len());

        let mut codec = LzCodec::new(&settings).unwrap();
        let streams = encode(&mut codec, input);
        assert_eq!(count_matches(&streams), 0);
        assert_eq!(streams[INSTRUCTION], b"\0aaaa".to_vec());
    }

    #[test]
    fn test_streams_in_any_order() {
        let settings = small_settings();
        let input = b"the rain in spain stays mainly in the plain, the rain in spain".repeat(4);
        let mut encoder = LzCodec::new(&settings).unwrap();
        let streams = encode(&mut encoder, &input);
        assert!(count_matches(&streams) > 0);

        let reordered = vec![
            streams[2].clone(),
            streams[0].clone(),
            streams[3].clone(),
            streams[1].clone(),
        ];
        let mut decoder = LzCodec::new(&settings).unwrap();
        assert_eq!(decode(&mut decoder, &reordered, input.len()).unwrap(), input);
    }

    #[test]
    fn test_bad_tags_rejected() {
        let a: &[u8] = &[0];
        let b: &[u8] = &[1, 0, 0, 0, 0];
        let c: &[u8] = &[2];
        let d: &[u8] = &[3];
        let dup: &[u8] = &[2];
        let bad: &[u8] = &[9];

        assert!(order_streams([a, b, c, d]).is_ok());
        assert!(order_streams([a, b, c, dup]).unwrap_err().is_corrupt());
        assert!(order_streams([a, b, c, bad]).unwrap_err().is_corrupt());
        assert!(order_streams([a, b, c, &[]]).unwrap_err().is_corrupt());
    }

    #[test]
    fn test_truncated_streams_are_corrupt() {
        let settings = small_settings();
        let input = b"abcdefabcdefabcdefabcdef-abcdefabcdef".to_vec();
        let mut encoder = LzCodec::new(&settings).unwrap();
        let mut streams = encode(&mut encoder, &input);

        let cut = streams[INSTRUCTION].len() - 2;
        streams[INSTRUCTION].truncate(cut);
        let mut decoder = LzCodec::new(&settings).unwrap();
        let err = decode(&mut decoder, &streams, input.len()).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_declared_length_too_large() {
        let streams = vec![vec![0u8], vec![1, 0xFF, 0xFF, 0, 0], vec![2], vec![3]];
        let mut decoder = LzCodec::new(&small_settings()).unwrap();
        let err = decode(&mut decoder, &streams, 16).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_history_carries_across_blocks() {
        let settings = small_settings();
        let first = b"0123456789 the quick brown fox jumps over the lazy dog 0123456789".to_vec();
        let second = b"the quick brown fox jumps over the lazy dog, twice over and over".to_vec();

        let mut encoder = LzCodec::new(&settings).unwrap();
        let mut decoder = LzCodec::new(&settings).unwrap();

        let s1 = encode(&mut encoder, &first);
        let s2 = encode(&mut encoder, &second);
        assert!(count_matches(&s2) > 0);

        assert_eq!(decode(&mut decoder, &s1, 256).unwrap(), first);
        assert_eq!(decode(&mut decoder, &s2, 256).unwrap(), second);
        assert_eq!(encoder.total_in, (first.len() + second.len()) as u64);
        assert_eq!(decoder.total_out, encoder.total_in);
    }

    #[test]
    fn test_long_distance_matches() {
        let settings = CodecSettings::default();
        let mut input = Vec::new();
        let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
        for _ in 0..3000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            input.push((seed >> 33) as u8);
        }
        let head = input[..600].to_vec();
        input.extend_from_slice(&head);
        input.extend_from_slice(b"tail padding bytes");

        let mut encoder = LzCodec::new(&settings).unwrap();
        let streams = encode(&mut encoder, &input);
        assert!(streams[INSTRUCTION].contains(&opcodes::LONG_MATCH));
        roundtrip(&settings, &input);
    }

    #[test]
    fn test_codec_over_stream_pool() {
        let settings = CodecSettings::default().with_block_bits(10);
        let mut pool = CodecStream::new(&settings);
        let mut encoder = LzCodec::new(&settings).unwrap();
        let mut decoder = LzCodec::new(&settings).unwrap();
        encoder.init_stream(&mut pool);
        decoder.init_stream(&mut pool);

        let input = b"pool pool pool pool pool pool pool pool".to_vec();
        let raw = pool.find_mut(BufferKind::Empty).unwrap();
        raw.fill_from(&input).unwrap();
        raw.set_kind(BufferKind::Raw);

        let written = encoder.compress_block(&mut pool).unwrap();
        assert_eq!(pool.count(BufferKind::Lz), 4);
        assert_eq!(pool.count(BufferKind::Raw), 0);
        assert_eq!(written as u64, encoder.total_out());

        let produced = decoder.decompress_block(&mut pool).unwrap();
        assert_eq!(produced, input.len());
        assert_eq!(pool.count(BufferKind::Lz), 0);
        let raw = pool.find_mut(BufferKind::Raw).unwrap();
        assert_eq!(raw.data(), &input[..]);
        assert_eq!(decoder.codec_type(), CodecType::Lz);
    }
}
