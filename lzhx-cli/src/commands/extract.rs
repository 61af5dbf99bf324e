//! Extract command implementation.

use crate::utils::{BarProgress, create_progress_bar, filter_entries};
use lzhx_archive::ArchiveReader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn cmd_extract(
    archive: &Path,
    output: &Path,
    include: &[String],
    exclude: &[String],
    verbose: bool,
    progress: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(archive)?;
    let mut reader = ArchiveReader::new(BufReader::new(file))?;

    println!("Extracting {} to {}", archive.display(), output.display());

    let to_extract = filter_entries(reader.entries(), include, exclude);
    // Refuse the whole archive before writing anything if one name is unsafe.
    for entry in &to_extract {
        entry.validate_path()?;
    }

    let total: u64 = to_extract.iter().map(|e| e.size).sum();
    let mut bar = BarProgress::new(create_progress_bar(total, progress));

    for entry in &to_extract {
        let path = reader.extract_entry_with_progress(entry, output, &mut bar)?;
        bar.complete(entry.size);
        if verbose {
            if entry.is_dir {
                bar.bar().println(format!("  Created: {}", path.display()));
            } else {
                bar.bar()
                    .println(format!("  Extracted: {} ({} bytes)", entry.name, entry.size));
            }
        }
    }
    bar.bar().finish_and_clear();

    println!("Extracted {} entries", to_extract.len());
    Ok(())
}
