//! Tree construction for flat object stores.
//!
//! Buckets have no directories, only keys. Directory nodes are synthesized
//! from key prefixes and memoized by `(parent, name)` so that every prefix
//! maps to exactly one node.

use std::collections::HashMap;

use async_trait::async_trait;

use super::arena::{NodeArena, NodeId};
use super::build::BuiltTree;
use super::path::is_plain_segment;
use crate::error::CoreResult;
use crate::log::Logger;

/// One object returned by a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub objects: Vec<ObjectSummary>,
    /// Token for the next page, `None` on the last one.
    pub next_page_token: Option<String>,
}

/// The listing primitive of an object-storage backend.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    /// Lists objects whose key starts with `prefix`, one page at a time.
    async fn list_objects(&self, prefix: &str, page_token: Option<&str>) -> CoreResult<ObjectPage>;
}

/// Turns a user-supplied source path into a listing prefix.
///
/// A leading `/` is dropped and a non-empty prefix always ends with `/`,
/// so `data` does not also match `database/...`.
pub fn listing_prefix(source_path: &str) -> String {
    let path = source_path.trim_start_matches('/').replace('\\', "/");
    if path.is_empty() || path.ends_with('/') {
        path
    } else {
        format!("{path}/")
    }
}

/// Turns a `/`-joined source path into an object key.
///
/// Backslashes become `/` and empty segments are dropped, so `/data//x`
/// and `data\\x` both address `data/x`.
pub fn object_key(source_path: &str) -> String {
    source_path
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds a tree from every object under `source_path`.
///
/// The root is named after the last prefix segment, or `bucket` when the
/// whole bucket is listed. Any page failure aborts the build: the listing is
/// a single root-level request. Keys with an empty, `.` or `..` segment
/// below the prefix are logged and left out.
pub async fn synthesize_from_objects(
    lister: &dyn ObjectLister,
    source_path: &str,
    bucket: &str,
    log: &dyn Logger,
) -> CoreResult<BuiltTree> {
    let prefix = listing_prefix(source_path);
    let root_name = prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(bucket);

    let mut tree = PrefixTree::new(root_name);
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = lister.list_objects(&prefix, page_token.as_deref()).await?;
        pages += 1;
        log.debug(&format!(
            "page {pages} of {bucket}/{prefix}: {} objects",
            page.objects.len()
        ));
        for object in &page.objects {
            if !tree.insert(&prefix, object) {
                log.error(&format!(
                    "skipping object {bucket}/{}: key does not map to a local path",
                    object.key
                ));
            }
        }
        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(BuiltTree::complete(tree.arena.into_tree()))
}

struct PrefixTree {
    arena: NodeArena,
    directories: HashMap<(NodeId, String), NodeId>,
}

impl PrefixTree {
    fn new(root_name: &str) -> Self {
        Self {
            arena: NodeArena::new(root_name),
            directories: HashMap::new(),
        }
    }

    /// Adds the nodes for one object. Returns `false` when the key was
    /// rejected; keys outside `prefix` and the prefix itself are ignored.
    fn insert(&mut self, prefix: &str, object: &ObjectSummary) -> bool {
        let Some(relative) = object.key.strip_prefix(prefix) else {
            return true;
        };
        if relative.is_empty() {
            return true;
        }

        // `a/b/` is a folder placeholder: every segment is a directory.
        let (placeholder, body) = match relative.strip_suffix('/') {
            Some(body) => (true, body),
            None => (false, relative),
        };
        let mut segments: Vec<&str> = body.split('/').collect();
        if !segments.iter().all(|segment| is_plain_segment(segment)) {
            return false;
        }
        let file_name = if placeholder { None } else { segments.pop() };

        let mut parent = NodeId::ROOT;
        for segment in segments {
            parent = self.directory(parent, segment);
        }
        if let Some(name) = file_name {
            self.arena.push_child(parent, name, false, object.size);
        }
        true
    }

    fn directory(&mut self, parent: NodeId, name: &str) -> NodeId {
        if let Some(&id) = self.directories.get(&(parent, name.to_string())) {
            return id;
        }
        let id = self.arena.push_child(parent, name, true, 0);
        self.directories.insert((parent, name.to_string()), id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::log::NullLogger;
    use crate::mirror::mirror_tree;
    use crate::test_support::{FakeBackend, MemoryObjects};
    use crate::tree::TreeNode;

    #[test]
    fn prefix_normalization() {
        assert_eq!(listing_prefix(""), "");
        assert_eq!(listing_prefix("/"), "");
        assert_eq!(listing_prefix("data"), "data/");
        assert_eq!(listing_prefix("/data/raw/"), "data/raw/");
        assert_eq!(listing_prefix("data\\raw"), "data/raw/");
    }

    #[tokio::test]
    async fn shared_prefixes_collapse_into_one_directory() {
        let store = MemoryObjects::single_page(&[("a/b.txt", 1), ("a/c/d.txt", 2)]);
        let built = synthesize_from_objects(&store, "", "bucket", &NullLogger)
            .await
            .unwrap();

        let expected = TreeNode::dir(
            "bucket",
            vec![TreeNode::dir(
                "a",
                vec![
                    TreeNode::file("b.txt", 1),
                    TreeNode::dir("c", vec![TreeNode::file("d.txt", 2)]),
                ],
            )],
        );
        assert_eq!(built.root, expected);
        assert_eq!(built.root.dir_count(), 3);
    }

    #[tokio::test]
    async fn prefix_becomes_root_name_and_is_stripped() {
        let store = MemoryObjects::single_page(&[
            ("data/raw/", 0),
            ("data/raw/x.csv", 5),
            ("data/raw/2024/y.csv", 6),
        ]);
        let built = synthesize_from_objects(&store, "/data/raw", "bucket", &NullLogger)
            .await
            .unwrap();

        assert_eq!(store.prefixes(), vec!["data/raw/".to_string()]);
        let expected = TreeNode::dir(
            "raw",
            vec![
                TreeNode::file("x.csv", 5),
                TreeNode::dir("2024", vec![TreeNode::file("y.csv", 6)]),
            ],
        );
        assert_eq!(built.root, expected);
    }

    #[tokio::test]
    async fn placeholder_keys_create_empty_directories() {
        let store = MemoryObjects::single_page(&[("empty/", 0), ("nested/inner/", 0)]);
        let built = synthesize_from_objects(&store, "", "bucket", &NullLogger)
            .await
            .unwrap();

        let expected = TreeNode::dir(
            "bucket",
            vec![
                TreeNode::dir("empty", vec![]),
                TreeNode::dir("nested", vec![TreeNode::dir("inner", vec![])]),
            ],
        );
        assert_eq!(built.root, expected);
    }

    #[tokio::test]
    async fn hidden_keys_are_kept() {
        let store = MemoryObjects::single_page(&[(".config/settings", 9)]);
        let built = synthesize_from_objects(&store, "", "bucket", &NullLogger)
            .await
            .unwrap();
        assert_eq!(built.root.children()[0].name(), ".config");
        assert_eq!(built.root.file_count(), 1);
    }

    #[tokio::test]
    async fn pages_are_consumed_in_order() {
        let store = MemoryObjects::paged(vec![
            vec![("logs/a.log", 1), ("logs/b.log", 2)],
            vec![("logs/c.log", 3), ("top.txt", 4)],
        ]);
        let built = synthesize_from_objects(&store, "", "bucket", &NullLogger)
            .await
            .unwrap();

        assert_eq!(store.tokens(), vec![None, Some("1".to_string())]);
        let expected = TreeNode::dir(
            "bucket",
            vec![
                TreeNode::dir(
                    "logs",
                    vec![
                        TreeNode::file("a.log", 1),
                        TreeNode::file("b.log", 2),
                        TreeNode::file("c.log", 3),
                    ],
                ),
                TreeNode::file("top.txt", 4),
            ],
        );
        assert_eq!(built.root, expected);
    }

    #[tokio::test]
    async fn listing_failure_aborts() {
        let store = MemoryObjects::failing();
        let err = synthesize_from_objects(&store, "x", "bucket", &NullLogger)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn keys_outside_prefix_are_ignored() {
        let store = MemoryObjects::single_page(&[("other/a", 1), ("data/b", 2)]);
        let built = synthesize_from_objects(&store, "data", "bucket", &NullLogger)
            .await
            .unwrap();
        assert_eq!(built.root, TreeNode::dir("data", vec![TreeNode::file("b", 2)]));
    }

    #[test]
    fn object_key_normalisation() {
        assert_eq!(object_key("/data/raw/x.csv"), "data/raw/x.csv");
        assert_eq!(object_key("data\\raw\\x.csv"), "data/raw/x.csv");
        assert_eq!(object_key("data//x"), "data/x");
        assert_eq!(object_key(""), "");
    }

    #[tokio::test]
    async fn traversal_keys_are_dropped() {
        let store = MemoryObjects::single_page(&[
            ("x/../../escaped.txt", 3),
            ("./here.txt", 1),
            ("a//b.txt", 1),
            ("up/../", 0),
            ("win\\..\\x", 1),
            ("ok/fine.txt", 4),
        ]);
        let built = synthesize_from_objects(&store, "", "bucket", &NullLogger)
            .await
            .unwrap();

        let expected = TreeNode::dir(
            "bucket",
            vec![TreeNode::dir("ok", vec![TreeNode::file("fine.txt", 4)])],
        );
        assert_eq!(built.root, expected);
    }

    #[tokio::test]
    async fn escaping_key_writes_nothing_outside_destination() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dest = tmp.path().join("a").join("dest");
        let store = MemoryObjects::single_page(&[("x/../../escaped.txt", 3)]);
        let backend = FakeBackend::new().with_file("x/../../escaped.txt", b"abc");

        let built = synthesize_from_objects(&store, "", "bucket", &NullLogger)
            .await
            .unwrap();
        let report = mirror_tree(&backend, &built.root, "", &dest, &NullLogger).await;

        assert_eq!(report.files_attempted(), 0);
        assert!(backend.attempts().is_empty());
        assert!(!tmp.path().join("a").join("escaped.txt").exists());
        assert!(!tmp.path().join("escaped.txt").exists());
    }
}
