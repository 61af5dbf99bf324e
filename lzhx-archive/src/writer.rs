//! Archive writer.

use crate::entry::{ArchiveEntry, entry_name, normalize_name};
use crate::hashing::HashingReader;
use crate::header::{ArchiveHeader, FileHeader};
use lzhx_codec::BlockPipeline;
use lzhx_core::error::{LzhxError, Result};
use lzhx_core::{CodecSettings, Fnv1a, NoProgress, ProgressCallback};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Writes an LZHX archive.
///
/// The archive header and every file header are written as placeholders
/// and patched once the sizes are known, so the output must be seekable.
/// Call [`finish`](Self::finish) to complete the archive.
///
/// # Example
///
/// ```
/// use lzhx_archive::{ArchiveReader, ArchiveWriter};
/// use std::io::Cursor;
///
/// let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()))?;
/// writer.add_data("hello.txt", b"Hello, World!")?;
/// let archive = writer.finish()?.into_inner();
///
/// let mut reader = ArchiveReader::new(Cursor::new(archive))?;
/// assert_eq!(reader.read_by_name("hello.txt")?, b"Hello, World!");
/// # Ok::<(), lzhx_core::LzhxError>(())
/// ```
pub struct ArchiveWriter<W: Write + Seek> {
    writer: W,
    settings: CodecSettings,
    pipeline: BlockPipeline,
    header: ArchiveHeader,
    start: u64,
    excluded: Vec<PathBuf>,
}

/// One step of a directory walk.
enum WalkItem {
    Directory(String),
    File(String, PathBuf),
}

/// A file compressed off the writer thread, waiting to be written.
struct PackedFile {
    name: String,
    size: u64,
    hash: u32,
    compressed: Vec<u8>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Start an archive with the default codec settings.
    pub fn new(writer: W) -> Result<Self> {
        Self::with_settings(writer, &CodecSettings::default())
    }

    /// Start an archive with custom codec settings.
    ///
    /// Readers must use the same settings.
    pub fn with_settings(mut writer: W, settings: &CodecSettings) -> Result<Self> {
        let pipeline = BlockPipeline::new(settings)?;
        let start = writer.stream_position()?;
        ArchiveHeader::default().write(&mut writer)?;

        Ok(Self {
            writer,
            settings: *settings,
            pipeline,
            header: ArchiveHeader::default(),
            start,
            excluded: Vec::new(),
        })
    }

    /// Totals of the entries written so far.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Skip `path` when walking directories with [`add_path`](Self::add_path).
    ///
    /// Used to keep an archive from swallowing itself.
    pub fn exclude_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.excluded.push(path.as_ref().canonicalize()?);
        Ok(())
    }

    /// Add an entry from memory.
    pub fn add_data(&mut self, name: &str, data: &[u8]) -> Result<ArchiveEntry> {
        self.add_reader(name, data, data.len() as u64, &mut NoProgress)
    }

    /// Add a file from disk under `name`.
    pub fn add_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<ArchiveEntry> {
        self.add_file_with_progress(name, path, &mut NoProgress)
    }

    /// Add a file from disk under `name`, reporting progress.
    pub fn add_file_with_progress<P>(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        progress: &mut P,
    ) -> Result<ArchiveEntry>
    where
        P: ProgressCallback + ?Sized,
    {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();
        self.add_reader(name, BufReader::new(file), size, progress)
    }

    /// Add an entry whose content is read from `reader` until EOF.
    ///
    /// # Arguments
    ///
    /// * `name` - Entry name, normalized to '/' separators
    /// * `reader` - Entry content
    /// * `size_hint` - Expected content size for progress reporting (0 if unknown)
    /// * `progress` - Progress receiver
    pub fn add_reader<R, P>(
        &mut self,
        name: &str,
        reader: R,
        size_hint: u64,
        progress: &mut P,
    ) -> Result<ArchiveEntry>
    where
        R: Read,
        P: ProgressCallback + ?Sized,
    {
        let name = normalize_name(name)?;
        let mut header = FileHeader::file(name.as_str());
        let header_pos = self.writer.stream_position()?;
        header.write(&mut self.writer)?;

        let mut source = HashingReader::new(reader);
        let stats =
            self.pipeline
                .compress_stream(&mut source, &mut self.writer, &name, size_hint, progress)?;
        header.compressed_size = stats.bytes_out;
        header.uncompressed_size = stats.bytes_in;
        header.hash = source.finish();

        let end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(header_pos))?;
        header.write(&mut self.writer)?;
        self.writer.seek(SeekFrom::Start(end))?;

        log::debug!(
            "added {}: {} -> {} bytes in {} blocks",
            name,
            stats.bytes_in,
            stats.bytes_out,
            stats.blocks
        );
        let data_offset = header_pos + header.encoded_len() as u64;
        self.record(header, data_offset)
    }

    /// Add a directory entry.
    pub fn add_directory(&mut self, name: &str) -> Result<ArchiveEntry> {
        let header = FileHeader::directory(normalize_name(name)?);
        let header_pos = self.writer.stream_position()?;
        header.write(&mut self.writer)?;

        log::debug!("added directory {}", header.name);
        let data_offset = header_pos + header.encoded_len() as u64;
        self.record(header, data_offset)
    }

    /// Add a file or a directory tree.
    ///
    /// Entry names are relative to the parent of `path`, so adding
    /// `/data/photos` yields `photos`, `photos/a.jpg`, ... Directories are
    /// walked in name order.
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> Result<Vec<ArchiveEntry>> {
        self.add_path_with_progress(path, &mut NoProgress)
    }

    /// [`add_path`](Self::add_path) with progress reporting for every file.
    pub fn add_path_with_progress<P>(
        &mut self,
        path: impl AsRef<Path>,
        progress: &mut P,
    ) -> Result<Vec<ArchiveEntry>>
    where
        P: ProgressCallback + ?Sized,
    {
        let mut added = Vec::new();
        for item in self.walk(path.as_ref())? {
            let entry = match item {
                WalkItem::Directory(name) => self.add_directory(&name)?,
                WalkItem::File(name, path) => self.add_file_with_progress(&name, &path, progress)?,
            };
            added.push(entry);
        }
        Ok(added)
    }

    /// [`add_path`](Self::add_path), compressing runs of files with
    /// [`add_files_parallel`](Self::add_files_parallel).
    ///
    /// Produces the same archive as `add_path`.
    pub fn add_path_parallel(&mut self, path: impl AsRef<Path>) -> Result<Vec<ArchiveEntry>> {
        let mut added = Vec::new();
        let mut batch: Vec<(String, PathBuf)> = Vec::new();
        for item in self.walk(path.as_ref())? {
            match item {
                WalkItem::Directory(name) => {
                    added.extend(self.add_files_parallel(&batch)?);
                    batch.clear();
                    added.push(self.add_directory(&name)?);
                }
                WalkItem::File(name, path) => batch.push((name, path)),
            }
        }
        added.extend(self.add_files_parallel(&batch)?);
        Ok(added)
    }

    /// Everything below `path` in archive order, minus excluded paths.
    fn walk(&self, path: &Path) -> Result<Vec<WalkItem>> {
        let base = path.canonicalize()?;
        let mut items = Vec::new();
        self.walk_tree(&base, &base, &mut items)?;
        Ok(items)
    }

    fn walk_tree(&self, path: &Path, base: &Path, items: &mut Vec<WalkItem>) -> Result<()> {
        if self.excluded.iter().any(|excluded| excluded == path) {
            log::debug!("skipping {}", path.display());
            return Ok(());
        }

        let name = entry_name(path, base)?;
        let metadata = fs::symlink_metadata(path)?;
        if metadata.file_type().is_symlink() && path.is_dir() {
            // Following these could revisit an ancestor forever.
            log::warn!("skipping symlinked directory {}", path.display());
            return Ok(());
        }
        if metadata.is_dir() {
            items.push(WalkItem::Directory(name));

            let mut children = fs::read_dir(path)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<std::io::Result<Vec<_>>>()?;
            children.sort();
            for child in children {
                self.walk_tree(&child, base, items)?;
            }
        } else {
            items.push(WalkItem::File(name, path.to_path_buf()));
        }
        Ok(())
    }

    /// Compress several files in parallel and append them in input order.
    ///
    /// Each file is read into memory and compressed with its own pipeline,
    /// so this trades memory for throughput on many small files.
    pub fn add_files_parallel(&mut self, files: &[(String, PathBuf)]) -> Result<Vec<ArchiveEntry>> {
        let settings = self.settings;
        let packed: Vec<Result<PackedFile>> = files
            .par_iter()
            .map(|(name, path)| -> Result<PackedFile> {
                let name = normalize_name(name)?;
                let data = fs::read(path)?;
                let mut pipeline = BlockPipeline::new(&settings)?;
                let compressed = pipeline.compress(&data)?;
                Ok(PackedFile {
                    name,
                    size: data.len() as u64,
                    hash: Fnv1a::compute(&data),
                    compressed,
                })
            })
            .collect();

        let mut added = Vec::with_capacity(packed.len());
        for file in packed {
            let file = file?;
            let header = FileHeader {
                compressed_size: file.compressed.len() as u64,
                uncompressed_size: file.size,
                hash: file.hash,
                ..FileHeader::file(file.name)
            };
            let header_pos = self.writer.stream_position()?;
            header.write(&mut self.writer)?;
            self.writer.write_all(&file.compressed)?;

            log::debug!(
                "added {}: {} -> {} bytes",
                header.name,
                header.uncompressed_size,
                header.compressed_size
            );
            let data_offset = header_pos + header.encoded_len() as u64;
            added.push(self.record(header, data_offset)?);
        }
        Ok(added)
    }

    fn record(&mut self, header: FileHeader, data_offset: u64) -> Result<ArchiveEntry> {
        self.header.entry_count = self
            .header
            .entry_count
            .checked_add(1)
            .ok_or_else(|| LzhxError::invalid_header("too many entries"))?;
        self.header.uncompressed_size += header.uncompressed_size;
        self.header.compressed_size += header.compressed_size;
        Ok(ArchiveEntry::from_header(header, data_offset))
    }

    /// Patch the archive header and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(self.start))?;
        self.header.write(&mut self.writer)?;
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;

        log::debug!(
            "archive finished: {} entries, {} -> {} bytes",
            self.header.entry_count,
            self.header.uncompressed_size,
            self.header.compressed_size
        );
        Ok(self.writer)
    }
}
