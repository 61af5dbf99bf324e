//! LZHX CLI - hash-chain LZ plus per-block Huffman archiver.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{ListOptions, cmd_auto, cmd_create, cmd_extract, cmd_list, cmd_test};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lzhx")]
#[command(author, version, about = "LZHX archiver - Pure Rust LZ + Huffman archive utility")]
#[command(long_about = "
LZHX archives files and directories with a hash-chain LZ compressor
followed by a per-block Huffman coder. Every entry carries an FNV-1a
hash of its content that is checked on extraction.

Examples:
  lzhx create backup.lzhx src/ notes.txt
  lzhx list -v backup.lzhx
  lzhx extract backup.lzhx -o restored
  lzhx test backup.lzhx
  lzhx auto photos/
  lzhx auto photos.lzhx
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new archive
    #[command(alias = "c")]
    Create {
        /// Output archive file
        archive: PathBuf,

        /// Files and directories to add
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Compress files on all cores
        #[arg(long)]
        parallel: bool,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Include only entries matching pattern (glob syntax: *.txt, src/**/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Show progress bar
        #[arg(short = 'P', long)]
        progress: bool,
    },

    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only entries matching pattern (glob syntax: *.txt, src/**/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Test archive integrity
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Archive a file or directory, or extract an LZHX archive
    Auto {
        /// File, directory or archive
        path: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Create {
            archive,
            inputs,
            verbose,
            parallel,
        } => cmd_create(&archive, &inputs, verbose, parallel),
        Commands::Extract {
            archive,
            output,
            include,
            exclude,
            verbose,
            progress,
        } => cmd_extract(&archive, &output, &include, &exclude, verbose, progress),
        Commands::List {
            archive,
            verbose,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                verbose,
                json,
                include: &include,
                exclude: &exclude,
            },
        ),
        Commands::Test { archive, verbose } => cmd_test(&archive, verbose),
        Commands::Auto { path } => cmd_auto(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
