//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use lzhx_archive::ArchiveEntry;
use lzhx_core::ProgressCallback;

/// Create a byte-counting progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style.progress_chars("█▓▒░ "));
    pb
}

/// Drives a progress bar from decoder notifications across several entries.
pub struct BarProgress {
    bar: ProgressBar,
    base: u64,
}

impl BarProgress {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar, base: 0 }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// Mark an entry of `size` decoded bytes as done.
    pub fn complete(&mut self, size: u64) {
        self.base += size;
        self.bar.set_position(self.base);
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&mut self, name: &str, _bytes_in: u64, bytes_out: u64, _stream_size: u64) {
        self.bar.set_message(name.to_string());
        self.bar.set_position(self.base + bytes_out);
    }
}

/// Check if a filename matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern_str: &String| {
        Pattern::new(pattern_str)
            .map(|pattern| pattern.matches(name))
            .unwrap_or(false)
    };

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Filter entries based on include/exclude patterns.
pub fn filter_entries(
    entries: &[ArchiveEntry],
    include: &[String],
    exclude: &[String],
) -> Vec<ArchiveEntry> {
    entries
        .iter()
        .filter(|e| matches_filters(&e.name, include, exclude))
        .cloned()
        .collect()
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[ArchiveEntry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!(
        "{:>10} {:>10} {:>6} {:>8}  Name",
        "Size", "Compressed", "Ratio", "Hash",
    );
    println!("{}", "-".repeat(60));

    let mut total_size = 0u64;
    let mut total_compressed = 0u64;

    for entry in entries {
        let ratio = if entry.size > 0 {
            format!("{:.1}%", entry.space_savings())
        } else {
            "-".to_string()
        };
        let type_prefix = if entry.is_dir { "d " } else { "  " };

        println!(
            "{:>10} {:>10} {:>6} {:08x}  {}{}",
            entry.size, entry.compressed_size, ratio, entry.hash, type_prefix, entry.name
        );

        total_size += entry.size;
        total_compressed += entry.compressed_size;
    }

    println!("{}", "-".repeat(60));
    let total_ratio = if total_size > 0 {
        (1.0 - total_compressed as f64 / total_size as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "{:>10} {:>10} {:>5.1}%          {} entries",
        total_size,
        total_compressed,
        total_ratio,
        entries.len()
    );
}
