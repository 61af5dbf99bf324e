//! List command implementation.

use crate::utils::{filter_entries, print_entries};
use lzhx_archive::{ArchiveEntry, ArchiveReader};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize, Deserialize)]
struct EntryJson {
    name: String,
    size: u64,
    compressed_size: u64,
    ratio: f64,
    hash: u32,
    is_dir: bool,
}

impl EntryJson {
    fn from_entry(entry: &ArchiveEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            compressed_size: entry.compressed_size,
            ratio: entry.compression_ratio(),
            hash: entry.hash,
            is_dir: entry.is_dir,
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize, Deserialize)]
struct ArchiveListJson {
    archive: String,
    format: String,
    total_size: u64,
    total_compressed: u64,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(archive: &Path, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(archive)?;
    let reader = ArchiveReader::new(BufReader::new(file))?;
    let entries = filter_entries(reader.entries(), options.include, options.exclude);

    if options.json {
        let listing = ArchiveListJson {
            archive: archive.display().to_string(),
            format: "LZHX".to_string(),
            total_size: reader.header().uncompressed_size,
            total_compressed: reader.header().compressed_size,
            entries: entries.iter().map(EntryJson::from_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if options.verbose {
        println!("Archive: {}", archive.display());
        println!();
    }
    print_entries(&entries, options.verbose);
    Ok(())
}
