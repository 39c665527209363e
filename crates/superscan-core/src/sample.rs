//! Flattening a tree into file entries and drawing random samples from it.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::log::Logger;
use crate::mirror::{create_directories, download_entries, MirrorReport};
use crate::source::Backend;
use crate::tree::{join_key, TreeNode};

/// A file leaf resolved to where it is read from and where it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    /// `/`-joined backend key.
    pub source: String,
    /// Location under the destination root, using host separators.
    pub destination: PathBuf,
}

/// Lists every file leaf of `root` in depth-first order.
///
/// The root maps to `source_root` on the backend and to `destination_root`
/// on disk; each level below appends the node's name to both.
pub fn flatten_files(
    root: &TreeNode,
    source_root: &str,
    destination_root: &Path,
) -> Vec<FlatEntry> {
    let mut entries = Vec::new();
    collect_files(root, source_root, destination_root, &mut entries);
    entries
}

fn collect_files(node: &TreeNode, source: &str, destination: &Path, out: &mut Vec<FlatEntry>) {
    for child in node.children() {
        let child_source = join_key(source, child.name());
        let child_destination = destination.join(child.name());
        if child.is_dir() {
            collect_files(child, &child_source, &child_destination, out);
        } else {
            out.push(FlatEntry {
                source: child_source,
                destination: child_destination,
            });
        }
    }
}

/// Picks at most `k` distinct entries uniformly at random.
///
/// When there are `k` entries or fewer, all of them are returned. Otherwise
/// `k` distinct indices are drawn without replacement, each subset equally
/// likely. The result keeps the input order.
pub fn choose_distinct<R: Rng + ?Sized>(
    entries: Vec<FlatEntry>,
    k: usize,
    rng: &mut R,
) -> Vec<FlatEntry> {
    if entries.len() <= k {
        return entries;
    }
    let mut selected = vec![false; entries.len()];
    for index in rand::seq::index::sample(rng, entries.len(), k).into_iter() {
        selected[index] = true;
    }
    entries
        .into_iter()
        .zip(selected)
        .filter_map(|(entry, keep)| keep.then_some(entry))
        .collect()
}

/// Flattens `root` and draws a sample of at most `k` files.
pub fn select_sample<R: Rng + ?Sized>(
    root: &TreeNode,
    source_root: &str,
    destination_root: &Path,
    k: usize,
    rng: &mut R,
) -> Vec<FlatEntry> {
    choose_distinct(flatten_files(root, source_root, destination_root), k, rng)
}

/// Mirrors the directory skeleton, then downloads a random sample of files.
///
/// A failed download is logged and counted; the remaining selected files are
/// still attempted and no replacement is drawn.
pub async fn sample_and_download<R: Rng + ?Sized>(
    backend: &dyn Backend,
    root: &TreeNode,
    source_root: &str,
    destination_root: &Path,
    k: usize,
    rng: &mut R,
    log: &dyn Logger,
) -> MirrorReport {
    let mut report = create_directories(root, destination_root, log).await;

    let all = flatten_files(root, source_root, destination_root);
    let total = all.len();
    let sample = choose_distinct(all, k, rng);
    if sample.len() == total {
        log.info(&format!("found {total} files, downloading all"));
    } else {
        log.info(&format!(
            "found {total} files, randomly selected {}",
            sample.len()
        ));
    }

    download_entries(backend, &sample, log, &mut report).await;
    log.info(&format!(
        "sample finished: {} of {} downloaded",
        report.files_downloaded,
        sample.len()
    ));
    report
}
