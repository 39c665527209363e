//! Tree construction for backends that list one directory at a time.
//!
//! The walk keeps an explicit stack of directories waiting to be listed.
//! Remote namespaces have no depth bound we can rely on, so nothing here
//! recurses.

use async_trait::async_trait;

use super::arena::{NodeArena, NodeId};
use super::node::TreeNode;
use super::path::{is_plain_segment, join_key};
use crate::error::CoreResult;
use crate::log::Logger;

/// One entry returned by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    pub name: String,
    pub is_dir: bool,
    /// Byte length; ignored for directories.
    pub size: u64,
    /// Backend identifier used to list this entry when it is a directory
    /// (filesystem path, drive folder id).
    pub id: String,
}

/// The directory a listing call is asked about.
#[derive(Debug, Clone, Copy)]
pub struct ListingTarget<'a> {
    /// Backend identifier of the directory.
    pub id: &'a str,
    /// `/`-joined path of the directory, starting at the scan's source path.
    pub path: &'a str,
}

/// The listing primitive of a hierarchical backend.
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Whether names starting with `.` are dropped while walking.
    fn skips_hidden(&self) -> bool;

    /// Returns the immediate entries of `target` in the backend's order.
    ///
    /// Entries the backend cannot represent are left out and reported on
    /// `log`.
    async fn list_entries(
        &self,
        target: ListingTarget<'_>,
        log: &dyn Logger,
    ) -> CoreResult<Vec<ListedEntry>>;
}

/// A built tree together with the directories that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTree {
    pub root: TreeNode,
    /// Paths of directories below the root whose listing failed. Those
    /// directories are present in the tree without children.
    pub incomplete: Vec<String>,
}

impl BuiltTree {
    pub fn complete(root: TreeNode) -> Self {
        Self {
            root,
            incomplete: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.incomplete.is_empty()
    }
}

struct PendingDir {
    node: NodeId,
    id: String,
    path: String,
}

/// Walks a hierarchical backend starting at `root_id`.
///
/// Pending directories are popped LIFO: after a directory is listed, its
/// last discovered subdirectory is listed next. Every node's children stay
/// in listing order regardless.
///
/// # Errors
///
/// Returns the listing error when the root itself cannot be listed. Failures
/// deeper in the tree are logged and recorded in [`BuiltTree::incomplete`].
pub async fn walk_directories(
    lister: &dyn DirectoryLister,
    root_name: &str,
    root_id: &str,
    root_path: &str,
    log: &dyn Logger,
) -> CoreResult<BuiltTree> {
    let mut arena = NodeArena::new(root_name);
    let mut incomplete = Vec::new();
    let mut pending = vec![PendingDir {
        node: NodeId::ROOT,
        id: root_id.to_string(),
        path: root_path.to_string(),
    }];

    while let Some(dir) = pending.pop() {
        log.debug(&format!("listing {}", display_path(&dir.path)));
        let target = ListingTarget {
            id: &dir.id,
            path: &dir.path,
        };
        let entries = match lister.list_entries(target, log).await {
            Ok(entries) => entries,
            Err(err) if dir.node == NodeId::ROOT => return Err(err),
            Err(err) => {
                log.error(&format!(
                    "failed to list {}: {err}",
                    display_path(&dir.path)
                ));
                incomplete.push(dir.path);
                continue;
            }
        };

        for entry in entries {
            if !is_plain_segment(&entry.name) {
                log.error(&format!(
                    "skipping entry {:?} in {}: not a valid file name",
                    entry.name,
                    display_path(&dir.path)
                ));
                continue;
            }
            if lister.skips_hidden() && entry.name.starts_with('.') {
                continue;
            }
            let child = arena.push_child(dir.node, &entry.name, entry.is_dir, entry.size);
            if entry.is_dir {
                pending.push(PendingDir {
                    node: child,
                    path: join_key(&dir.path, &entry.name),
                    id: entry.id,
                });
            }
        }
    }

    Ok(BuiltTree {
        root: arena.into_tree(),
        incomplete,
    })
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "."
    } else {
        path
    }
}
