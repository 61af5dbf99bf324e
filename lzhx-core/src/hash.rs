//! FNV-1a 32-bit hashing.
//!
//! Used twice in LZHX: over short prefixes to pick a match-finder bucket, and
//! over whole files as the archive integrity check.

/// FNV-1a offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;

/// FNV-1a prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Incremental FNV-1a hasher.
///
/// # Example
///
/// ```
/// use lzhx_core::hash::Fnv1a;
///
/// let mut hasher = Fnv1a::new();
/// hasher.update(b"Hello, ");
/// hasher.update(b"World!");
/// assert_eq!(hasher.finish(), Fnv1a::compute(b"Hello, World!"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv1a {
    state: u32,
}

impl Fnv1a {
    /// Create a hasher at the offset basis.
    pub const fn new() -> Self {
        Self {
            state: FNV_OFFSET_BASIS,
        }
    }

    /// Feed more bytes.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.state ^= u32::from(byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    /// Current hash value.
    pub fn finish(&self) -> u32 {
        self.state
    }

    /// Hash a complete buffer.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finish()
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}
