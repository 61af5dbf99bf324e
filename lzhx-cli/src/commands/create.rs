//! Create command implementation.

use lzhx_archive::{ArchiveEntry, ArchiveWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub fn cmd_create(
    archive: &Path,
    inputs: &[PathBuf],
    verbose: bool,
    parallel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if inputs.is_empty() {
        return Err("No input files specified".into());
    }
    for input in inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }

    println!("Creating {}", archive.display());

    let file = File::create(archive)?;
    let mut writer = ArchiveWriter::new(BufWriter::new(file))?;
    writer.exclude_path(archive)?;

    let mut added: Vec<ArchiveEntry> = Vec::new();
    for input in inputs {
        let entries = if parallel {
            writer.add_path_parallel(input)?
        } else {
            writer.add_path(input)?
        };
        if verbose {
            for entry in &entries {
                if entry.is_dir {
                    println!("  Added: {}/", entry.name);
                } else {
                    println!(
                        "  Added: {} ({} -> {} bytes)",
                        entry.name, entry.size, entry.compressed_size
                    );
                }
            }
        }
        added.extend(entries);
    }

    let header = *writer.header();
    writer.finish()?;

    let ratio = if header.uncompressed_size > 0 {
        (1.0 - header.compressed_size as f64 / header.uncompressed_size as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Created {} with {} entries ({} -> {} bytes, {:.1}% saved)",
        archive.display(),
        added.len(),
        header.uncompressed_size,
        header.compressed_size,
        ratio
    );
    Ok(())
}
