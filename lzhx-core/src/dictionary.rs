//! Ring buffer holding the LZ history window.
//!
//! Encoder and decoder each own one [`DictionaryBuffer`] and feed it every
//! byte they emit, so both sides see the same history at every step. Match
//! positions live in ring coordinates; on the wire they travel as the
//! distance behind the write cursor (see [`DictionaryBuffer::to_relative`]).

/// Fixed-capacity ring of the most recent bytes of a stream.
#[derive(Debug, Clone)]
pub struct DictionaryBuffer {
    /// Backing store, zero-filled on creation.
    buffer: Vec<u8>,
    /// Next write position, always `< capacity`.
    cursor: usize,
    /// Number of valid bytes (saturates at capacity).
    size: usize,
    /// Capacity mask (capacity - 1).
    mask: usize,
}

impl DictionaryBuffer {
    /// Create a zero-filled ring.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is not a power of 2. `CodecSettings::validate`
    /// rejects such windows before any codec is built.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "Dictionary capacity must be a power of 2, got {}",
            capacity
        );

        Self {
            buffer: vec![0; capacity],
            cursor: 0,
            size: 0,
            mask: capacity - 1,
        }
    }

    /// Ring capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of valid bytes of history.
    pub fn len(&self) -> usize {
        self.size
    }

    /// True before the first byte is written.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Ring position the next byte will be written to.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.cursor = 0;
        self.size = 0;
        self.buffer.fill(0);
    }

    /// Append a byte, overwriting the oldest one once full.
    ///
    /// Returns the ring position the byte was stored at.
    #[inline]
    pub fn put_byte(&mut self, byte: u8) -> usize {
        let written = self.cursor;
        self.buffer[written] = byte;
        self.cursor = (written + 1) & self.mask;
        if self.size < self.buffer.len() {
            self.size += 1;
        }
        written
    }

    /// Read the byte at ring position `position` (taken modulo capacity).
    #[inline]
    pub fn get_byte(&self, position: usize) -> u8 {
        self.buffer[position & self.mask]
    }

    /// Distance of ring position `position` behind the write cursor.
    #[inline]
    pub fn to_relative(&self, position: usize) -> usize {
        self.cursor.wrapping_sub(position) & self.mask
    }

    /// Ring position lying `relative` bytes behind the write cursor.
    #[inline]
    pub fn to_absolute(&self, relative: usize) -> usize {
        self.cursor.wrapping_sub(relative) & self.mask
    }

    /// Convert between ring positions and cursor-relative distances.
    ///
    /// `to_relative == true` maps a ring position to a distance, `false`
    /// maps a distance back to a ring position. The two directions are
    /// inverses of each other for every value below the capacity.
    pub fn convert_position(&self, to_relative: bool, value: usize) -> usize {
        if to_relative {
            self.to_relative(value)
        } else {
            self.to_absolute(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut dict = DictionaryBuffer::new(8);
        assert!(dict.is_empty());

        assert_eq!(dict.put_byte(b'A'), 0);
        assert_eq!(dict.put_byte(b'B'), 1);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.position(), 2);
        assert_eq!(dict.get_byte(0), b'A');
        assert_eq!(dict.get_byte(1), b'B');
    }

    #[test]
    fn test_wraparound() {
        let mut dict = DictionaryBuffer::new(4);
        for b in 0..6u8 {
            dict.put_byte(b);
        }
        // Ring holds [4, 5, 2, 3], cursor back at 2.
        assert_eq!(dict.len(), 4);
        assert_eq!(dict.position(), 2);
        assert_eq!(dict.get_byte(0), 4);
        assert_eq!(dict.get_byte(1), 5);
        assert_eq!(dict.get_byte(2), 2);
        assert_eq!(dict.get_byte(6), 2); // masked
    }

    #[test]
    fn test_relative_conversion() {
        let mut dict = DictionaryBuffer::new(16);
        for b in 0..10u8 {
            dict.put_byte(b);
        }
        assert_eq!(dict.to_relative(9), 1);
        assert_eq!(dict.to_relative(0), 10);
        assert_eq!(dict.to_absolute(10), 0);
        assert_eq!(dict.get_byte(dict.to_absolute(3)), 7);
    }

    #[test]
    fn test_conversion_is_bijection() {
        let mut dict = DictionaryBuffer::new(256);
        for round in 0..3 {
            for i in 0..(97 + round * 50) {
                dict.put_byte(i as u8);
            }
            for r in 0..dict.capacity() {
                let abs = dict.convert_position(false, r);
                assert!(abs < dict.capacity());
                assert_eq!(dict.convert_position(true, abs), r);
            }
            for p in 0..dict.capacity() {
                assert_eq!(dict.to_absolute(dict.to_relative(p)), p);
            }
        }
    }

    #[test]
    fn test_clear() {
        let mut dict = DictionaryBuffer::new(8);
        dict.put_byte(0xAA);
        dict.clear();
        assert!(dict.is_empty());
        assert_eq!(dict.position(), 0);
        assert_eq!(dict.get_byte(0), 0);
    }

    #[test]
    #[should_panic(expected = "power of 2")]
    fn test_rejects_non_power_of_two() {
        let _ = DictionaryBuffer::new(1000);
    }
}
