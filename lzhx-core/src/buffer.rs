//! Working buffers shared between codec stages.
//!
//! A [`CodecStream`] owns a small fixed pool of [`CodecBuffer`]s. A stage
//! claims a buffer by looking up the first slot with the kind it needs and
//! hands the result on by changing the slot's kind; bytes never move between
//! slots. A block travels `Raw -> 4 x Lz -> Hf` when compressing and back
//! when decompressing.

use crate::error::{LzhxError, Result};
use crate::settings::CodecSettings;
use std::fmt;

/// What a working buffer currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Free for reuse.
    Empty,
    /// Uncompressed block data.
    Raw,
    /// One of the four LZ sub-streams.
    Lz,
    /// Huffman-coded data.
    Hf,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BufferKind::Empty => "EMPTY",
            BufferKind::Raw => "RAW",
            BufferKind::Lz => "LZ",
            BufferKind::Hf => "HF",
        };
        f.write_str(name)
    }
}

/// A fixed-capacity byte buffer tagged with its current role.
#[derive(Debug, Clone)]
pub struct CodecBuffer {
    data: Vec<u8>,
    size: usize,
    kind: BufferKind,
}

impl CodecBuffer {
    /// Allocate an empty buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            size: 0,
            kind: BufferKind::Empty,
        }
    }

    /// Current role.
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Change the role, handing the buffer to the next stage.
    pub fn set_kind(&mut self, kind: BufferKind) {
        self.kind = kind;
    }

    /// Number of valid bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Set the number of valid bytes.
    pub fn set_size(&mut self, size: usize) -> Result<()> {
        if size > self.data.len() {
            return Err(LzhxError::buffer_overrun(size, self.data.len()));
        }
        self.size = size;
        Ok(())
    }

    /// The valid bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// The whole backing store, for producers filling the buffer.
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Replace the contents with `bytes`.
    pub fn fill_from(&mut self, bytes: &[u8]) -> Result<()> {
        let capacity = self.data.len();
        let dst = self
            .data
            .get_mut(..bytes.len())
            .ok_or_else(|| LzhxError::buffer_overrun(bytes.len(), capacity))?;
        dst.copy_from_slice(bytes);
        self.size = bytes.len();
        Ok(())
    }

    /// Mark the buffer free.
    pub fn release(&mut self) {
        self.size = 0;
        self.kind = BufferKind::Empty;
    }
}

/// Pool of working buffers plus per-stream bookkeeping.
#[derive(Debug, Clone)]
pub struct CodecStream {
    buffers: Vec<CodecBuffer>,
    /// Size of the stream being processed, for progress reporting.
    stream_size: u64,
}

impl CodecStream {
    /// Allocate `settings.buffer_count()` buffers of `settings.buffer_capacity()` bytes.
    pub fn new(settings: &CodecSettings) -> Self {
        Self::with_buffers(settings.buffer_count(), settings.buffer_capacity())
    }

    /// Allocate `count` buffers of `capacity` bytes.
    pub fn with_buffers(count: usize, capacity: usize) -> Self {
        Self {
            buffers: (0..count).map(|_| CodecBuffer::new(capacity)).collect(),
            stream_size: 0,
        }
    }

    /// Number of buffers in the pool.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// True for a pool without buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Size of the stream being processed.
    pub fn stream_size(&self) -> u64 {
        self.stream_size
    }

    /// Record the size of the stream being processed.
    pub fn set_stream_size(&mut self, size: u64) {
        self.stream_size = size;
    }

    /// Index of the first buffer of `kind`.
    pub fn find(&self, kind: BufferKind) -> Option<usize> {
        self.buffers.iter().position(|b| b.kind == kind)
    }

    /// First buffer of `kind`.
    pub fn find_mut(&mut self, kind: BufferKind) -> Option<&mut CodecBuffer> {
        self.buffers.iter_mut().find(|b| b.kind == kind)
    }

    /// Count buffers of `kind`.
    pub fn count(&self, kind: BufferKind) -> usize {
        self.buffers.iter().filter(|b| b.kind == kind).count()
    }

    /// Claim the first buffer of `kind` and retag it as `new_kind`.
    ///
    /// Successive claims of the same kind return distinct slots because the
    /// claimed slot no longer matches.
    pub fn claim(&mut self, kind: BufferKind, new_kind: BufferKind) -> Result<usize> {
        let index = self
            .find(kind)
            .ok_or_else(|| LzhxError::buffer_unavailable(kind))?;
        self.buffers[index].kind = new_kind;
        Ok(index)
    }

    /// Buffer at `index`.
    pub fn get(&self, index: usize) -> Option<&CodecBuffer> {
        self.buffers.get(index)
    }

    /// Mutable buffer at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut CodecBuffer> {
        self.buffers.get_mut(index)
    }

    /// Borrow several distinct buffers mutably at once.
    ///
    /// Fails if an index is out of range or listed twice.
    pub fn many_mut<const N: usize>(&mut self, indices: [usize; N]) -> Result<[&mut CodecBuffer; N]> {
        let mut slots: [Option<&mut CodecBuffer>; N] = std::array::from_fn(|_| None);
        for (i, buffer) in self.buffers.iter_mut().enumerate() {
            if let Some(k) = indices.iter().position(|&j| j == i) {
                slots[k] = Some(buffer);
            }
        }

        let invalid = || {
            LzhxError::configuration(format!("invalid buffer selection {indices:?}"))
        };
        let borrowed: Vec<&mut CodecBuffer> = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;
        borrowed.try_into().map_err(|_| invalid())
    }

    /// Release every buffer.
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_distinct_slots() {
        let mut stream = CodecStream::with_buffers(4, 16);
        assert_eq!(stream.count(BufferKind::Empty), 4);

        let a = stream.claim(BufferKind::Empty, BufferKind::Lz).unwrap();
        let b = stream.claim(BufferKind::Empty, BufferKind::Lz).unwrap();
        assert_ne!(a, b);
        assert_eq!(stream.count(BufferKind::Lz), 2);
        assert_eq!(stream.find(BufferKind::Lz), Some(a));
    }

    #[test]
    fn test_claim_exhausted() {
        let mut stream = CodecStream::with_buffers(1, 16);
        stream.claim(BufferKind::Empty, BufferKind::Raw).unwrap();
        let err = stream.claim(BufferKind::Empty, BufferKind::Raw).unwrap_err();
        assert!(matches!(
            err,
            LzhxError::BufferUnavailable {
                kind: BufferKind::Empty
            }
        ));
    }

    #[test]
    fn test_fill_and_release() {
        let mut stream = CodecStream::with_buffers(2, 4);
        let buffer = stream.find_mut(BufferKind::Empty).unwrap();
        buffer.fill_from(b"abc").unwrap();
        buffer.set_kind(BufferKind::Raw);
        assert_eq!(buffer.data(), b"abc");
        assert!(buffer.fill_from(b"abcde").is_err());
        assert!(buffer.set_size(5).is_err());

        stream.reset();
        assert_eq!(stream.count(BufferKind::Empty), 2);
        assert_eq!(stream.get(0).unwrap().size(), 0);
    }

    #[test]
    fn test_many_mut() {
        let mut stream = CodecStream::with_buffers(3, 4);
        {
            let [first, last] = stream.many_mut([2, 0]).unwrap();
            first.fill_from(b"zz").unwrap();
            last.fill_from(b"a").unwrap();
        }
        assert_eq!(stream.get(2).unwrap().data(), b"zz");
        assert_eq!(stream.get(0).unwrap().data(), b"a");

        assert!(stream.many_mut([1, 1]).is_err());
        assert!(stream.many_mut([0, 3]).is_err());
    }

    #[test]
    fn test_pool_from_settings() {
        let settings = CodecSettings::default().with_block_bits(8);
        let stream = CodecStream::new(&settings);
        assert_eq!(stream.len(), 8);
        assert_eq!(stream.get(0).unwrap().capacity(), settings.buffer_capacity());
    }
}
