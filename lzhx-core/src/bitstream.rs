//! Bit-level I/O over caller-owned byte slices.
//!
//! `BitWriter` and `BitReader` keep a `(byte_pos, bit_pos)` cursor into a
//! fixed slice. The Huffman stage packs variable-length codes and the
//! serialized tree through them.
//!
//! # Bit Ordering
//!
//! Bits are packed LSB-first within each byte: the first bit written lands in
//! bit 0 of the first byte. Multi-bit values are written low bit first.
//!
//! # Capacity
//!
//! Every access is checked against the slice length. Running past the end
//! yields [`LzhxError::BufferOverrun`]; decoders map that to a corrupt stream.
//!
//! # Example
//!
//! ```
//! use lzhx_core::bitstream::{BitReader, BitWriter};
//!
//! let mut buf = [0u8; 4];
//! let mut writer = BitWriter::new(&mut buf);
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0b1100, 4).unwrap();
//! let used = writer.bytes_used();
//!
//! let mut reader = BitReader::new(&buf[..used]);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1100);
//! ```

use crate::error::{LzhxError, Result};

/// A bit-level writer over a mutable byte slice.
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitWriter<'a> {
    /// Create a writer positioned at the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Create a writer positioned at byte `offset` of `buf`.
    pub fn at(buf: &'a mut [u8], offset: usize) -> Self {
        Self {
            buf,
            byte_pos: offset,
            bit_pos: 0,
        }
    }

    /// Number of bytes touched so far, counting a partially filled last byte.
    pub fn bytes_used(&self) -> usize {
        self.byte_pos + usize::from(self.bit_pos > 0)
    }

    /// Total bits written relative to the start of the slice.
    pub fn bit_position(&self) -> u64 {
        self.byte_pos as u64 * 8 + u64::from(self.bit_pos)
    }

    /// Write a single bit.
    ///
    /// The first bit written into a byte assigns the whole byte, so the
    /// remaining bits of a partial final byte are always zero.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        let capacity = self.buf.len();
        let byte = self
            .buf
            .get_mut(self.byte_pos)
            .ok_or_else(|| LzhxError::buffer_overrun(self.byte_pos + 1, capacity))?;

        if self.bit_pos == 0 {
            *byte = u8::from(bit);
        } else if bit {
            *byte |= 1 << self.bit_pos;
        }

        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
        Ok(())
    }

    /// Write the low `count` bits of `value`, LSB first.
    ///
    /// # Arguments
    ///
    /// * `value` - Bits to write
    /// * `count` - Number of bits to write (0-32)
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u8) -> Result<()> {
        debug_assert!(count <= 32, "Cannot write more than 32 bits at once");

        if count == 8 && self.bit_pos == 0 {
            return self.write_byte_aligned(value as u8);
        }

        for i in 0..count {
            self.write_bit((value >> i) & 1 == 1)?;
        }
        Ok(())
    }

    /// Store a whole byte at an aligned position.
    fn write_byte_aligned(&mut self, byte: u8) -> Result<()> {
        let capacity = self.buf.len();
        let slot = self
            .buf
            .get_mut(self.byte_pos)
            .ok_or_else(|| LzhxError::buffer_overrun(self.byte_pos + 1, capacity))?;
        *slot = byte;
        self.byte_pos += 1;
        Ok(())
    }
}

/// A bit-level reader over an immutable byte slice.
#[derive(Debug)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Create a reader positioned at byte `offset` of `buf`.
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        Self {
            buf,
            byte_pos: offset,
            bit_pos: 0,
        }
    }

    /// Number of bytes touched so far, counting a partially consumed last byte.
    pub fn bytes_used(&self) -> usize {
        self.byte_pos + usize::from(self.bit_pos > 0)
    }

    /// Total bits read relative to the start of the slice.
    pub fn bit_position(&self) -> u64 {
        self.byte_pos as u64 * 8 + u64::from(self.bit_pos)
    }

    /// Read a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        let byte = *self
            .buf
            .get(self.byte_pos)
            .ok_or_else(|| LzhxError::buffer_overrun(self.byte_pos + 1, self.buf.len()))?;

        let bit = (byte >> self.bit_pos) & 1 == 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
        Ok(bit)
    }

    /// Read `count` bits, the first bit read landing in the LSB.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of bits to read (0-32)
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= 32, "Cannot read more than 32 bits at once");

        if count == 8 && self.bit_pos == 0 {
            let byte = *self
                .buf
                .get(self.byte_pos)
                .ok_or_else(|| LzhxError::buffer_overrun(self.byte_pos + 1, self.buf.len()))?;
            self.byte_pos += 1;
            return Ok(u32::from(byte));
        }

        let mut value = 0u32;
        for i in 0..count {
            if self.read_bit()? {
                value |= 1 << i;
            }
        }
        Ok(value)
    }
}
