//! Read/write adapters that hash the bytes passing through them.

use lzhx_core::Fnv1a;
use std::io::{self, Read, Write};

/// Hashes everything read from the inner reader.
#[derive(Debug)]
pub struct HashingReader<R> {
    inner: R,
    hasher: Fnv1a,
}

impl<R: Read> HashingReader<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Fnv1a::new(),
        }
    }

    /// Hash of the bytes read so far.
    pub fn finish(&self) -> u32 {
        self.hasher.finish()
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

/// Hashes everything written to the inner writer.
#[derive(Debug)]
pub struct HashingWriter<W> {
    inner: W,
    hasher: Fnv1a,
}

impl<W: Write> HashingWriter<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Fnv1a::new(),
        }
    }

    /// Hash of the bytes written so far.
    pub fn finish(&self) -> u32 {
        self.hasher.finish()
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
