//! Auto command: archive or extract depending on what the path is.

use lzhx_archive::{ArchiveReader, ArchiveWriter, EXTENSION, is_lzhx_archive, unique_path};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Directories and plain files are archived next to themselves as
/// `<name>.lzhx`; LZHX archives are extracted into a directory named after
/// the archive. Existing names are never overwritten.
pub fn cmd_auto(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.canonicalize()?;

    if path.is_file() && is_lzhx_archive(&path)? {
        let dest = unique_path(&path, "");
        let mut reader = ArchiveReader::new(BufReader::new(File::open(&path)?))?;
        let extracted = reader.extract_all(&dest)?;
        println!(
            "Extracted {} entries from {} to {}",
            extracted.len(),
            path.display(),
            dest.display()
        );
        return Ok(());
    }

    let archive = unique_path(&path, EXTENSION);
    let mut writer = ArchiveWriter::new(BufWriter::new(File::create(&archive)?))?;
    let added = writer.add_path(&path)?;
    let header = *writer.header();
    writer.finish()?;

    println!(
        "Compressed {} to {} ({} entries, {} -> {} bytes)",
        path.display(),
        archive.display(),
        added.len(),
        header.uncompressed_size,
        header.compressed_size
    );
    Ok(())
}
