use std::path::PathBuf;

use clap::Parser;
use superscan_core::SourceKind;

/// Scan a storage backend, print its tree, and mirror or sample it locally.
#[derive(Parser, Debug)]
#[command(name = "superscan", author, version, about, long_about = None)]
pub struct Args {
    /// Backend to scan: filesystem, s3, gcs or google-drive.
    #[arg(long, value_parser = parse_source)]
    pub source: SourceKind,

    /// Path to scan or download. Defaults to the backend's configured start path.
    #[arg(long)]
    pub path: Option<String>,

    /// Local directory to download into. Without it the tree is only printed.
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Mirror the whole tree under `--path` instead of a single file.
    #[arg(long)]
    pub recursive: bool,

    /// Download only this many randomly chosen files. [0 = all]
    #[arg(long, default_value_t = 0)]
    pub sample: usize,

    /// Configuration file. Defaults to $SUPERSCAN_CONFIG or ~/.superscan/config.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_source(value: &str) -> Result<SourceKind, String> {
    value.parse::<SourceKind>().map_err(|_| {
        let known: Vec<&str> = SourceKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown source '{value}' (expected one of: {})", known.join(", "))
    })
}
