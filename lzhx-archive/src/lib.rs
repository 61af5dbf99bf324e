//! # LZHX Archive
//!
//! The LZHX archive container: a fixed archive header followed by one
//! file header and compressed stream per entry.
//!
//! - [`header`]: Archive and file header layouts
//! - [`entry`]: Entry metadata, name normalization and extraction paths
//! - [`writer`]: [`ArchiveWriter`], including directory walking
//! - [`reader`]: [`ArchiveReader`], with size and hash verification
//!
//! ## Example
//!
//! ```rust
//! use lzhx_archive::{ArchiveReader, ArchiveWriter};
//! use std::io::Cursor;
//!
//! let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()))?;
//! writer.add_directory("docs")?;
//! writer.add_data("docs/readme.txt", b"read me, read me, read me")?;
//! let bytes = writer.finish()?.into_inner();
//!
//! let mut reader = ArchiveReader::new(Cursor::new(bytes))?;
//! for entry in reader.entries() {
//!     println!("{} {} bytes", entry.name, entry.size);
//! }
//! assert_eq!(reader.verify_all()?, 2);
//! # Ok::<(), lzhx_core::LzhxError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
mod hashing;
pub mod header;
pub mod reader;
pub mod writer;

// Re-exports
pub use entry::{ArchiveEntry, entry_name, normalize_name, unique_path};
pub use header::{ArchiveHeader, EXTENSION, FileHeader, is_lzhx_archive};
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;
