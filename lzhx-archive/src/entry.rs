//! Archive entries and entry names.

use crate::header::FileHeader;
use lzhx_core::error::{LzhxError, Result};
use std::path::{Component, Path, PathBuf};

/// One entry of an archive, as seen by a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name within the archive, '/' separated.
    pub name: String,
    /// True for directory entries.
    pub is_dir: bool,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    /// FNV-1a hash of the uncompressed content.
    pub hash: u32,
    /// Offset of the compressed data within the archive.
    pub offset: u64,
}

impl ArchiveEntry {
    pub(crate) fn from_header(header: FileHeader, offset: u64) -> Self {
        Self {
            is_dir: header.is_directory(),
            name: header.name,
            size: header.uncompressed_size,
            compressed_size: header.compressed_size,
            hash: header.hash,
            offset,
        }
    }

    /// Get the compression ratio (compressed/uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.size as f64
        }
    }

    /// Get the space savings as a percentage.
    pub fn space_savings(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            (1.0 - self.compression_ratio()) * 100.0
        }
    }

    /// Validate the entry name for extraction.
    ///
    /// Returns an error for absolute names and names with `..` components.
    pub fn validate_path(&self) -> Result<()> {
        relative_path(&self.name).map(|_| ())
    }

    /// Path of this entry below `dest`.
    pub fn output_path(&self, dest: &Path) -> Result<PathBuf> {
        Ok(dest.join(relative_path(&self.name)?))
    }
}

/// Turn an entry name into a relative path, rejecting anything that could
/// escape the extraction directory.
fn relative_path(name: &str) -> Result<PathBuf> {
    if name.contains('\0') || name.contains('\\') {
        return Err(LzhxError::path_traversal(name));
    }

    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(LzhxError::path_traversal(name));
            }
        }
    }

    if path.as_os_str().is_empty() {
        return Err(LzhxError::path_traversal(name));
    }
    Ok(path)
}

/// Normalize a caller-supplied entry name.
///
/// Backslashes become '/', `.` components and repeated separators are
/// dropped. Names that would be unsafe to extract are rejected.
pub fn normalize_name(name: &str) -> Result<String> {
    let unified = name.replace('\\', "/");
    let parts: Vec<&str> = unified
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();

    if unified.starts_with('/') || parts.is_empty() || parts.contains(&"..") {
        return Err(LzhxError::path_traversal(name));
    }
    let normalized = parts.join("/");
    relative_path(&normalized)?;
    Ok(normalized)
}

/// Entry name for `path`, relative to the parent of `base`.
///
/// Archiving `/data/photos` names its files `photos/...`. Paths that are
/// not valid UTF-8 are rejected rather than stored under a lossy name.
pub fn entry_name(path: &Path, base: &Path) -> Result<String> {
    let root = base.parent().unwrap_or(base);
    let relative = path.strip_prefix(root).unwrap_or(path);
    let name = relative.to_str().ok_or_else(|| {
        LzhxError::invalid_header(format!(
            "entry name is not valid UTF-8: {}",
            relative.display()
        ))
    })?;
    normalize_name(name)
}

/// First free path derived from `path` with its extension replaced by
/// `extension`.
///
/// While the candidate exists, a `0` is appended to the stem:
/// `data.lzhx`, `data0.lzhx`, `data00.lzhx`, ... An empty `extension`
/// drops the extension, which names extraction directories.
pub fn unique_path(path: &Path, extension: &str) -> PathBuf {
    let mut stem = path.with_extension("").into_os_string();
    loop {
        let mut candidate = stem.clone();
        if !extension.is_empty() {
            candidate.push(".");
            candidate.push(extension);
        }
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            return candidate;
        }
        stem.push("0");
    }
}
