//! Reproducing a built tree on local disk.
//!
//! Mirroring runs in two passes. The first creates every directory, the
//! second downloads every file. When the second pass starts, each file's
//! parent directory already exists (or its creation has already failed and
//! been reported), so downloads never create directories themselves.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::log::Logger;
use crate::sample::{flatten_files, FlatEntry};
use crate::source::Backend;
use crate::tree::TreeNode;

/// Counters for one mirror or sample run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MirrorReport {
    /// Directories ensured on disk, the destination root included.
    pub directories_created: u64,
    pub directories_failed: u64,
    pub files_downloaded: u64,
    pub files_failed: u64,
}

impl MirrorReport {
    /// Number of download calls issued.
    pub fn files_attempted(&self) -> u64 {
        self.files_downloaded + self.files_failed
    }

    pub fn has_failures(&self) -> bool {
        self.directories_failed > 0 || self.files_failed > 0
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} downloaded {} of {} files ({} failed), {} directories created ({} failed)",
            self.files_downloaded,
            self.files_attempted(),
            self.files_failed,
            self.directories_created,
            self.directories_failed
        )
    }
}

impl fmt::Display for MirrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format("[MIRROR]"))
    }
}

/// Pass 1: creates `destination_root` and one directory per directory node.
///
/// Creation is idempotent. When a directory cannot be created the error is
/// logged and nothing below it is attempted; sibling subtrees continue.
pub async fn create_directories(
    root: &TreeNode,
    destination_root: &Path,
    log: &dyn Logger,
) -> MirrorReport {
    let mut report = MirrorReport::default();
    let mut pending: Vec<(&TreeNode, PathBuf)> = vec![(root, destination_root.to_path_buf())];

    while let Some((node, path)) = pending.pop() {
        if let Err(err) = tokio::fs::create_dir_all(&path).await {
            report.directories_failed += 1;
            log.error(&format!(
                "failed to create directory {}: {err}",
                path.display()
            ));
            continue;
        }
        report.directories_created += 1;
        log.debug(&format!("created directory {}", path.display()));

        // Reversed so the first child is popped first.
        for child in node.children().iter().rev().filter(|c| c.is_dir()) {
            pending.push((child, path.join(child.name())));
        }
    }

    report
}

/// Downloads `entries` one at a time, counting successes and failures.
pub async fn download_entries(
    backend: &dyn Backend,
    entries: &[FlatEntry],
    log: &dyn Logger,
    report: &mut MirrorReport,
) {
    let total = entries.len();
    for (index, entry) in entries.iter().enumerate() {
        log.info(&format!("downloading {}/{total}: {}", index + 1, entry.source));
        match backend.download_file(&entry.source, &entry.destination).await {
            Ok(()) => {
                report.files_downloaded += 1;
                log.debug(&format!(
                    "downloaded {} to {}",
                    entry.source,
                    entry.destination.display()
                ));
            }
            Err(err) => {
                report.files_failed += 1;
                log.error(&format!("failed to download {}: {err}", entry.source));
            }
        }
    }
}

/// Mirrors the whole tree: directory skeleton first, then every file.
///
/// `source_root` is the path the tree was built from; file keys are formed
/// by appending ancestor names to it with `/`.
pub async fn mirror_tree(
    backend: &dyn Backend,
    root: &TreeNode,
    source_root: &str,
    destination_root: &Path,
    log: &dyn Logger,
) -> MirrorReport {
    log.info("creating directory structure");
    let mut report = create_directories(root, destination_root, log).await;

    log.info("starting file downloads");
    let entries = flatten_files(root, source_root, destination_root);
    download_entries(backend, &entries, log, &mut report).await;

    log.info(&report.to_string());
    report
}
