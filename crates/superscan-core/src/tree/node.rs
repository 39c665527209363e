//! Tree node representation.

/// A single file or directory in a scanned namespace.
///
/// `TreeNode` is immutable once built: fields are private and only the
/// builders in [`crate::tree`] assemble nodes. Each node owns its children;
/// there are no parent links. Paths are not stored, they are rebuilt by
/// joining ancestor names during a walk.
///
/// # Examples
///
/// ```
/// use superscan_core::TreeNode;
///
/// let tree = TreeNode::dir("proj", vec![
///     TreeNode::dir("src", vec![TreeNode::file("main.txt", 10)]),
///     TreeNode::dir("docs", vec![]),
/// ]);
/// assert_eq!(tree.node_count(), 4);
/// assert_eq!(tree.file_count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    name: String,
    is_dir: bool,
    size: u64,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// Creates a leaf node. A file never has children.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
            children: Vec::new(),
        }
    }

    /// Creates a directory node owning `children` in the given order.
    /// Directory sizes are always `0`.
    pub fn dir(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
            children,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        is_dir: bool,
        size: u64,
        children: Vec<TreeNode>,
    ) -> Self {
        if is_dir {
            Self::dir(name, children)
        } else {
            Self::file(name, size)
        }
    }

    /// Returns the entry's own segment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Returns the file size in bytes. Always `0` for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the children in listing order.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Number of file leaves in this subtree.
    pub fn file_count(&self) -> usize {
        if !self.is_dir {
            return 1;
        }
        self.children.iter().map(TreeNode::file_count).sum()
    }

    /// Number of directories in this subtree, including `self` when it is one.
    pub fn dir_count(&self) -> usize {
        if !self.is_dir {
            return 0;
        }
        1 + self.children.iter().map(TreeNode::dir_count).sum::<usize>()
    }

    /// Sum of all file sizes in this subtree.
    pub fn total_size(&self) -> u64 {
        if !self.is_dir {
            return self.size;
        }
        self.children.iter().map(TreeNode::total_size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_has_no_children() {
        let node = TreeNode::file("a.txt", 42);
        assert!(!node.is_dir());
        assert_eq!(node.size(), 42);
        assert!(node.children().is_empty());
    }

    #[test]
    fn dir_has_zero_size() {
        let node = TreeNode::dir("docs", vec![TreeNode::file("a", 5)]);
        assert!(node.is_dir());
        assert_eq!(node.size(), 0);
        assert_eq!(node.total_size(), 5);
    }

    #[test]
    fn from_parts_drops_children_of_files() {
        let node = TreeNode::from_parts(
            "weird".to_string(),
            false,
            7,
            vec![TreeNode::file("child", 1)],
        );
        assert!(!node.is_dir());
        assert!(node.children().is_empty());
        assert_eq!(node.size(), 7);
    }

    #[test]
    fn from_parts_zeroes_directory_size() {
        let node = TreeNode::from_parts("d".to_string(), true, 4096, Vec::new());
        assert!(node.is_dir());
        assert_eq!(node.size(), 0);
    }

    #[test]
    fn counts_cover_whole_subtree() {
        let tree = TreeNode::dir(
            "root",
            vec![
                TreeNode::dir("a", vec![TreeNode::file("x", 1), TreeNode::file("y", 2)]),
                TreeNode::dir("empty", vec![]),
                TreeNode::file("z", 3),
            ],
        );
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.file_count(), 3);
        assert_eq!(tree.dir_count(), 3);
        assert_eq!(tree.total_size(), 6);
    }

    #[test]
    fn children_keep_insertion_order() {
        let tree = TreeNode::dir(
            "root",
            vec![TreeNode::file("b", 0), TreeNode::file("a", 0), TreeNode::file("c", 0)],
        );
        let names: Vec<&str> = tree.children().iter().map(TreeNode::name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
