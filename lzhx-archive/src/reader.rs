//! Archive reader.

use crate::entry::ArchiveEntry;
use crate::hashing::HashingWriter;
use crate::header::{ArchiveHeader, FileHeader};
use lzhx_codec::BlockPipeline;
use lzhx_core::error::{LzhxError, Result};
use lzhx_core::{CodecSettings, NoProgress, ProgressCallback};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Reads an LZHX archive.
///
/// All file headers are read up front; entry data is decompressed on
/// demand and checked against the stored size and hash.
pub struct ArchiveReader<R: Read + Seek> {
    reader: R,
    pipeline: BlockPipeline,
    header: ArchiveHeader,
    entries: Vec<ArchiveEntry>,
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Open an archive written with the default codec settings.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_settings(reader, &CodecSettings::default())
    }

    /// Open an archive written with custom codec settings.
    pub fn with_settings(mut reader: R, settings: &CodecSettings) -> Result<Self> {
        let pipeline = BlockPipeline::new(settings)?;

        let start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        let header = ArchiveHeader::read(&mut reader)?;
        let entries = read_entries(&mut reader, &header, end)?;
        log::debug!(
            "opened archive: {} entries, {} -> {} bytes",
            entries.len(),
            header.uncompressed_size,
            header.compressed_size
        );

        Ok(Self {
            reader,
            pipeline,
            header,
            entries,
        })
    }

    /// The archive header.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// All entries in archive order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Find an entry by name.
    pub fn find(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Decompress an entry into `writer`.
    ///
    /// Returns the number of bytes written. Directories write nothing.
    pub fn extract_to<W: Write>(&mut self, entry: &ArchiveEntry, writer: W) -> Result<u64> {
        self.extract_with_progress(entry, writer, &mut NoProgress)
    }

    /// Decompress an entry into `writer`, reporting progress.
    ///
    /// # Errors
    ///
    /// `CorruptStream` if the data does not decode to the stored size,
    /// `HashMismatch` if it decodes to different content. In both cases
    /// `writer` may already hold part of the output.
    pub fn extract_with_progress<W, P>(
        &mut self,
        entry: &ArchiveEntry,
        writer: W,
        progress: &mut P,
    ) -> Result<u64>
    where
        W: Write,
        P: ProgressCallback + ?Sized,
    {
        if entry.is_dir {
            return Ok(0);
        }

        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let source = self.reader.by_ref().take(entry.compressed_size);
        let mut sink = HashingWriter::new(writer);
        let stats = self.pipeline.decompress_stream(
            source,
            &mut sink,
            entry.compressed_size,
            &entry.name,
            progress,
        )?;

        if stats.bytes_out != entry.size {
            return Err(LzhxError::corrupt(
                entry.offset,
                format!(
                    "{}: expected {} bytes, decoded {}",
                    entry.name, entry.size, stats.bytes_out
                ),
            ));
        }
        let computed = sink.finish();
        if computed != entry.hash {
            return Err(LzhxError::hash_mismatch(&entry.name, entry.hash, computed));
        }

        log::trace!("{}: {} bytes, hash {:#010x}", entry.name, stats.bytes_out, computed);
        Ok(stats.bytes_out)
    }

    /// Decompress an entry into memory.
    pub fn read(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(entry.size.min(1 << 24) as usize);
        self.extract_to(entry, &mut data)?;
        Ok(data)
    }

    /// Decompress the entry called `name` into memory.
    pub fn read_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .find(name)
            .cloned()
            .ok_or_else(|| LzhxError::entry_not_found(name))?;
        self.read(&entry)
    }

    /// Decompress an entry and discard the output, checking size and hash.
    pub fn verify(&mut self, entry: &ArchiveEntry) -> Result<()> {
        self.extract_to(entry, io::sink()).map(|_| ())
    }

    /// Verify every entry, stopping at the first failure.
    ///
    /// Returns the number of entries checked.
    pub fn verify_all(&mut self) -> Result<usize> {
        let entries = self.entries.clone();
        for entry in &entries {
            self.verify(entry)?;
        }
        Ok(entries.len())
    }

    /// Extract an entry below `dest`, creating parent directories.
    pub fn extract_entry(&mut self, entry: &ArchiveEntry, dest: &Path) -> Result<PathBuf> {
        self.extract_entry_with_progress(entry, dest, &mut NoProgress)
    }

    /// [`extract_entry`](Self::extract_entry) with progress reporting.
    ///
    /// A file that fails to decode is removed again.
    pub fn extract_entry_with_progress<P>(
        &mut self,
        entry: &ArchiveEntry,
        dest: &Path,
        progress: &mut P,
    ) -> Result<PathBuf>
    where
        P: ProgressCallback + ?Sized,
    {
        let path = entry.output_path(dest)?;
        if entry.is_dir {
            fs::create_dir_all(&path)?;
            return Ok(path);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(&path)?);
        let result = self
            .extract_with_progress(entry, &mut out, progress)
            .and_then(|_| out.flush().map_err(LzhxError::from));
        if let Err(e) = result {
            drop(out);
            if let Err(remove) = fs::remove_file(&path) {
                log::warn!("could not remove {}: {}", path.display(), remove);
            }
            return Err(e);
        }

        log::debug!("extracted {}", path.display());
        Ok(path)
    }

    /// Extract every entry below `dest`.
    ///
    /// All names are validated before anything is written.
    pub fn extract_all(&mut self, dest: &Path) -> Result<Vec<PathBuf>> {
        for entry in &self.entries {
            entry.validate_path()?;
        }
        let entries = self.entries.clone();
        entries
            .iter()
            .map(|entry| self.extract_entry(entry, dest))
            .collect()
    }

    /// Return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn read_entries<R: Read + Seek>(
    reader: &mut R,
    header: &ArchiveHeader,
    end: u64,
) -> Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::with_capacity(header.entry_count.min(1024) as usize);
    for _ in 0..header.entry_count {
        let file = FileHeader::read(reader)?;
        let offset = reader.stream_position()?;
        if file.compressed_size > end.saturating_sub(offset) {
            return Err(LzhxError::invalid_header(format!(
                "entry {} runs past the end of the archive",
                file.name
            )));
        }
        reader.seek(SeekFrom::Start(offset + file.compressed_size))?;
        entries.push(ArchiveEntry::from_header(file, offset));
    }
    Ok(entries)
}
