//! Fixed-width little-endian integer packing.
//!
//! The free functions pack/unpack at an explicit offset and return the number
//! of bytes consumed. [`ByteWriter`] and [`ByteReader`] wrap the same
//! operations with a running cursor, which is how the LZ streams are filled
//! and drained.

use crate::error::{LzhxError, Result};

/// Write `value` as 2 little-endian bytes at `offset`.
pub fn write_u16_le(buf: &mut [u8], offset: usize, value: u16) -> Result<usize> {
    write_array(buf, offset, value.to_le_bytes())
}

/// Write `value` as 4 little-endian bytes at `offset`.
pub fn write_u32_le(buf: &mut [u8], offset: usize, value: u32) -> Result<usize> {
    write_array(buf, offset, value.to_le_bytes())
}

/// Read 2 little-endian bytes at `offset`.
pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    read_array(buf, offset).map(u16::from_le_bytes)
}

/// Read 4 little-endian bytes at `offset`.
pub fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32> {
    read_array(buf, offset).map(u32::from_le_bytes)
}

fn write_array<const N: usize>(buf: &mut [u8], offset: usize, bytes: [u8; N]) -> Result<usize> {
    let capacity = buf.len();
    let end = offset + N;
    let dst = buf
        .get_mut(offset..end)
        .ok_or_else(|| LzhxError::buffer_overrun(end, capacity))?;
    dst.copy_from_slice(&bytes);
    Ok(N)
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let end = offset + N;
    let src = buf
        .get(offset..end)
        .ok_or_else(|| LzhxError::buffer_overrun(end, buf.len()))?;
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(src);
    Ok(bytes)
}

/// Appending cursor over a fixed-capacity output slice.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    /// Create a cursor at the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Append one byte.
    #[inline]
    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        let capacity = self.buf.len();
        let slot = self
            .buf
            .get_mut(self.pos)
            .ok_or_else(|| LzhxError::buffer_overrun(self.pos + 1, capacity))?;
        *slot = value;
        self.pos += 1;
        Ok(())
    }

    /// Append a little-endian u16.
    pub fn put_u16_le(&mut self, value: u16) -> Result<()> {
        self.pos += write_u16_le(self.buf, self.pos, value)?;
        Ok(())
    }

    /// Append a little-endian u32.
    pub fn put_u32_le(&mut self, value: u32) -> Result<()> {
        self.pos += write_u32_le(self.buf, self.pos, value)?;
        Ok(())
    }
}

/// Consuming cursor over an input slice.
///
/// Reads past the end report [`LzhxError::BufferOverrun`]; callers decoding
/// untrusted data convert that with [`LzhxError::into_corrupt`].
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Consume one byte.
    #[inline]
    pub fn get_u8(&mut self) -> Result<u8> {
        let value = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| LzhxError::buffer_overrun(self.pos + 1, self.buf.len()))?;
        self.pos += 1;
        Ok(value)
    }

    /// Consume a little-endian u16.
    pub fn get_u16_le(&mut self) -> Result<u16> {
        let value = read_u16_le(self.buf, self.pos)?;
        self.pos += 2;
        Ok(value)
    }

    /// Consume a little-endian u32.
    pub fn get_u32_le(&mut self) -> Result<u32> {
        let value = read_u32_le(self.buf, self.pos)?;
        self.pos += 4;
        Ok(value)
    }
}
