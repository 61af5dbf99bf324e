//! Archive and file headers.
//!
//! All fields are little-endian.
//!
//! ```text
//! archive header (32 bytes)
//!   0  [u8; 4]  "LZHX"
//!   4  u32      0xFFFFFFFB
//!   8  u32      entry count
//!  12  u32      flags (must be 0)
//!  16  u64      total uncompressed size
//!  24  u64      total compressed size
//!
//! file header (25 bytes + name)
//!   0  u8       flags (bit 0: directory)
//!   1  u64      compressed size
//!   9  u64      uncompressed size
//!  17  u32      name length
//!  21  u32      FNV-1a hash of the uncompressed content
//!  25  [u8]     UTF-8 name, '/' separated
//! ```

use lzhx_core::error::{LzhxError, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

/// Archive signature.
pub const SIGNATURE: [u8; 4] = *b"LZHX";

/// Secondary signature following [`SIGNATURE`].
pub const SIGNATURE2: u32 = 0xFFFF_FFFB;

/// Size of the archive header.
pub const ARCHIVE_HEADER_SIZE: usize = 32;

/// Size of a file header without its name.
pub const FILE_HEADER_SIZE: usize = 25;

/// Conventional archive file extension.
pub const EXTENSION: &str = "lzhx";

/// Longest entry name accepted when reading.
pub const MAX_NAME_LEN: usize = 4096;

/// File header flag: the entry is a directory.
pub const FLAG_DIRECTORY: u8 = 0x01;

/// Header at the start of every archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Number of file headers that follow.
    pub entry_count: u32,
    /// Archive flags.
    pub flags: u32,
    /// Sum of all entries' uncompressed sizes.
    pub uncompressed_size: u64,
    /// Sum of all entries' compressed sizes.
    pub compressed_size: u64,
}

impl ArchiveHeader {
    /// Serialize the header.
    pub fn to_bytes(&self) -> [u8; ARCHIVE_HEADER_SIZE] {
        let mut bytes = [0u8; ARCHIVE_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&SIGNATURE);
        bytes[4..8].copy_from_slice(&SIGNATURE2.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.entry_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.flags.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.uncompressed_size.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.compressed_size.to_le_bytes());
        bytes
    }

    /// Write the header.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// True if `bytes` start with both signatures.
    pub fn sniff(bytes: &[u8]) -> bool {
        bytes.len() >= 8
            && bytes[0..4] == SIGNATURE
            && u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) == SIGNATURE2
    }

    /// Parse a serialized header.
    pub fn parse(bytes: &[u8; ARCHIVE_HEADER_SIZE]) -> Result<Self> {
        if bytes[0..4] != SIGNATURE {
            return Err(LzhxError::invalid_magic(SIGNATURE, &bytes[0..4]));
        }
        if !Self::sniff(bytes) {
            return Err(LzhxError::invalid_magic(SIGNATURE2.to_le_bytes(), &bytes[4..8]));
        }

        let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let u64_at = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(raw)
        };

        let header = Self {
            entry_count: u32_at(8),
            flags: u32_at(12),
            uncompressed_size: u64_at(16),
            compressed_size: u64_at(24),
        };
        if header.flags != 0 {
            return Err(LzhxError::invalid_header(format!(
                "unsupported archive flags {:#010x} (encrypted archives are not supported)",
                header.flags
            )));
        }
        Ok(header)
    }

    /// Read and validate a header.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; ARCHIVE_HEADER_SIZE];
        reader.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                LzhxError::invalid_header("archive shorter than its header")
            } else {
                e.into()
            }
        })?;
        Self::parse(&bytes)
    }
}

/// Header preceding each entry's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Entry flags.
    pub flags: u8,
    /// Size of the compressed data that follows the header.
    pub compressed_size: u64,
    /// Size of the original content.
    pub uncompressed_size: u64,
    /// FNV-1a hash of the original content.
    pub hash: u32,
    /// Entry name.
    pub name: String,
}

impl FileHeader {
    /// Header for a file entry; sizes and hash are filled in later.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            flags: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            hash: 0,
            name: name.into(),
        }
    }

    /// Header for a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            flags: FLAG_DIRECTORY,
            hash: lzhx_core::Fnv1a::new().finish(),
            ..Self::file(name)
        }
    }

    /// True for directory entries.
    pub fn is_directory(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    /// Serialized size including the name.
    pub fn encoded_len(&self) -> usize {
        FILE_HEADER_SIZE + self.name.len()
    }

    /// Write the header and name.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let name = self.name.as_bytes();
        let name_len = u32::try_from(name.len())
            .map_err(|_| LzhxError::invalid_header("entry name too long"))?;

        let mut header = Vec::with_capacity(self.encoded_len());
        header.push(self.flags);
        header.extend_from_slice(&self.compressed_size.to_le_bytes());
        header.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        header.extend_from_slice(&name_len.to_le_bytes());
        header.extend_from_slice(&self.hash.to_le_bytes());
        header.extend_from_slice(name);

        writer.write_all(&header)?;
        Ok(())
    }

    /// Read a header and its name.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let truncated = |e: std::io::Error| {
            if e.kind() == ErrorKind::UnexpectedEof {
                LzhxError::invalid_header("truncated file header")
            } else {
                e.into()
            }
        };

        let mut fixed = [0u8; FILE_HEADER_SIZE];
        reader.read_exact(&mut fixed).map_err(truncated)?;

        let mut u64_raw = [0u8; 8];
        u64_raw.copy_from_slice(&fixed[1..9]);
        let compressed_size = u64::from_le_bytes(u64_raw);
        u64_raw.copy_from_slice(&fixed[9..17]);
        let uncompressed_size = u64::from_le_bytes(u64_raw);
        let name_len = u32::from_le_bytes([fixed[17], fixed[18], fixed[19], fixed[20]]) as usize;
        let hash = u32::from_le_bytes([fixed[21], fixed[22], fixed[23], fixed[24]]);

        if name_len == 0 || name_len > MAX_NAME_LEN {
            return Err(LzhxError::invalid_header(format!(
                "entry name length {name_len} outside 1..={MAX_NAME_LEN}"
            )));
        }
        let mut name = vec![0u8; name_len];
        reader.read_exact(&mut name).map_err(truncated)?;
        let name = String::from_utf8(name)
            .map_err(|_| LzhxError::invalid_header("entry name is not valid UTF-8"))?;

        Ok(Self {
            flags: fixed[0],
            compressed_size,
            uncompressed_size,
            hash,
            name,
        })
    }
}

/// Check whether the file at `path` starts with an LZHX archive header.
///
/// Files too short to hold the signatures are simply not archives.
pub fn is_lzhx_archive(path: impl AsRef<Path>) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 8];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(ArchiveHeader::sniff(&magic)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}
