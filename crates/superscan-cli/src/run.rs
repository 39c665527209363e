//! Dispatch from parsed arguments to the core operations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use rand::rngs::StdRng;
use rand::SeedableRng;
use superscan_core::tree::format_size;
use superscan_core::{
    mirror_tree, open_backend, render_tree, sample_and_download, Backend, BuiltTree, Config,
    Logger, MirrorReport, SourceKind, TracingLogger, TreeNode,
};

use crate::cli::Args;

pub async fn run(args: &Args, config: &Config) -> anyhow::Result<()> {
    let backend = open_backend(args.source, config)
        .await
        .with_context(|| format!("cannot open {} backend", args.source.description()))?;
    let source_path = args
        .path
        .clone()
        .unwrap_or_else(|| default_path(args.source, config));
    let log = TracingLogger;

    match &args.destination {
        None => {
            let built = build(backend.as_ref(), &source_path, &log).await?;
            print!("{}", render_tree(&built.root));
            println!("\n{}", tree_footer(&built.root));
        }
        Some(destination) if !args.recursive => {
            let target = download_one(backend.as_ref(), &source_path, destination).await?;
            println!("downloaded {source_path} to {}", target.display());
        }
        Some(destination) => {
            let built = build(backend.as_ref(), &source_path, &log).await?;
            print!("{}", render_tree(&built.root));
            let report = if args.sample > 0 {
                let mut rng = StdRng::from_entropy();
                sample_and_download(
                    backend.as_ref(),
                    &built.root,
                    &source_path,
                    destination,
                    args.sample,
                    &mut rng,
                    &log,
                )
                .await
            } else {
                mirror_tree(backend.as_ref(), &built.root, &source_path, destination, &log).await
            };
            println!("{}", summary_line(&report, args.sample));
            if report.has_failures() {
                tracing::warn!("some entries were not mirrored; see the errors above");
            }
        }
    }
    Ok(())
}

async fn build(
    backend: &dyn Backend,
    source_path: &str,
    log: &dyn Logger,
) -> anyhow::Result<BuiltTree> {
    let built = backend
        .build_tree(source_path, log)
        .await
        .with_context(|| format!("failed to scan '{}'", display_source(source_path)))?;
    for path in &built.incomplete {
        tracing::warn!("directory {path} could not be listed; its contents are missing");
    }
    Ok(built)
}

async fn download_one(
    backend: &dyn Backend,
    source_path: &str,
    destination: &Path,
) -> anyhow::Result<PathBuf> {
    let Some(name) = file_basename(source_path) else {
        bail!(
            "'{source_path}' names a directory\n{}",
            tips(&[
                "Use --recursive to download a directory",
                "Or give the path of a single file",
            ])
        );
    };
    tokio::fs::create_dir_all(destination)
        .await
        .with_context(|| format!("cannot create {}", destination.display()))?;
    let target = destination.join(name);
    backend
        .download_file(source_path, &target)
        .await
        .with_context(|| format!("failed to download '{source_path}'"))?;
    Ok(target)
}

/// The path scanned when `--path` is absent.
pub fn default_path(kind: SourceKind, config: &Config) -> String {
    match kind {
        SourceKind::Filesystem => String::new(),
        SourceKind::S3 => config.s3.start_path.clone(),
        SourceKind::Gcs => config.gcs.start_path.clone(),
        SourceKind::GoogleDrive => config.drive.start_path.clone(),
    }
}

/// Last component of a file path; `None` for an empty path or one ending in a separator.
pub fn file_basename(source_path: &str) -> Option<&str> {
    if source_path.is_empty() || source_path.ends_with(['/', '\\']) {
        return None;
    }
    source_path
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// `N directories, M files, SIZE` under a listing; the root is not counted.
pub fn tree_footer(root: &TreeNode) -> String {
    let directories = root.dir_count().saturating_sub(1);
    let files = root.file_count();
    format!(
        "{directories} {}, {files} {}, {}",
        if directories == 1 { "directory" } else { "directories" },
        if files == 1 { "file" } else { "files" },
        format_size(root.total_size())
    )
}

pub fn summary_line(report: &MirrorReport, sample: usize) -> String {
    if sample > 0 {
        report.format("[SAMPLE]")
    } else {
        report.format("[MIRROR]")
    }
}

pub fn tips(lines: &[&str]) -> String {
    let mut out = String::from("Tips:");
    for line in lines {
        out.push_str("\n  - ");
        out.push_str(line);
    }
    out
}

pub fn not_found_tips() -> String {
    tips(&[
        "Verify the path exists on the selected source",
        "List the source without --destination to see what is there",
        "Check that your credentials can read this location",
    ])
}

fn display_source(source_path: &str) -> &str {
    if source_path.is_empty() {
        "."
    } else {
        source_path
    }
}
