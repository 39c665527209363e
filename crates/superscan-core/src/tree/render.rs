//! Text rendering of a built tree.

use super::node::TreeNode;
use crate::nfc_string;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const CONTINUATION: &str = "│   ";
const BLANK: &str = "    ";

const SIZE_UNITS: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

/// Renders `root` as a branch-drawn listing, one line per node.
///
/// The root line carries no connector. Every other line is indented by four
/// columns per level, with `│` continuing under siblings that are not last.
/// Directories end in `/`; files carry a human-readable size.
///
/// ```
/// use superscan_core::{render_tree, TreeNode};
///
/// let tree = TreeNode::dir("proj", vec![
///     TreeNode::dir("src", vec![TreeNode::file("main.txt", 10)]),
///     TreeNode::dir("docs", vec![]),
/// ]);
/// assert_eq!(
///     render_tree(&tree),
///     "proj/\n├── src/\n│   └── main.txt (10 B)\n└── docs/\n"
/// );
/// ```
pub fn render_tree(root: &TreeNode) -> String {
    let mut out = String::new();
    out.push_str(&node_label(root));
    out.push('\n');
    render_children(root, "", &mut out);
    out
}

fn render_children(node: &TreeNode, prefix: &str, out: &mut String) {
    let count = node.children().len();
    for (index, child) in node.children().iter().enumerate() {
        let is_last = index + 1 == count;
        out.push_str(prefix);
        out.push_str(if is_last { LAST_BRANCH } else { BRANCH });
        out.push_str(&node_label(child));
        out.push('\n');

        if child.is_dir() {
            let nested = format!("{prefix}{}", if is_last { BLANK } else { CONTINUATION });
            render_children(child, &nested, out);
        }
    }
}

/// The text shown for a single node: `name/` or `name (size)`.
///
/// Names are shown in NFC so decomposed Hangul reads as whole syllables.
/// The node itself keeps the backend's form.
pub fn node_label(node: &TreeNode) -> String {
    let name = nfc_string(node.name());
    if node.is_dir() {
        if name.ends_with('/') {
            name
        } else {
            format!("{name}/")
        }
    } else {
        format!("{name} ({})", format_size(node.size()))
    }
}

/// Formats a byte count with binary prefixes.
///
/// Below 1024 the exact count is shown (`512 B`); above, the value is divided
/// by 1024 until it fits and printed with one decimal (`1.5 KB`).
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{size} B");
    }
    let mut divisor = UNIT;
    let mut exponent = 0;
    let mut scaled = size / UNIT;
    while scaled >= UNIT {
        divisor *= UNIT;
        exponent += 1;
        scaled /= UNIT;
    }
    format!(
        "{:.1} {}B",
        size as f64 / divisor as f64,
        SIZE_UNITS[exponent]
    )
}
