//! The backend-agnostic tree model and the code that builds and renders it.
//!
//! - [`node::TreeNode`]: an immutable file-or-directory node owning its children.
//! - [`build`]: iterative walk for backends that list one directory at a time.
//! - [`objects`]: directory synthesis from flat object-store keys.
//! - [`render`]: branch-drawn text listing.

mod arena;
pub mod build;
pub mod node;
pub mod objects;
pub mod path;
pub mod render;

pub use build::{walk_directories, BuiltTree, DirectoryLister, ListedEntry, ListingTarget};
pub use node::TreeNode;
pub use objects::{
    listing_prefix, object_key, synthesize_from_objects, ObjectLister, ObjectPage, ObjectSummary,
};
pub use path::{is_plain_segment, join_key};
pub use render::{format_size, node_label, render_tree};
