//! SuperScan core library, backend-agnostic tree scanning and mirroring.
//!
//! `superscan-core` builds a file tree from a storage backend, renders it as
//! text, and reproduces it (or a random sample of its files) on local disk.
//! The command line front end (`superscan-cli`) is a thin layer over it.
//!
//! # Modules
//!
//! - [`tree`]: The [`TreeNode`] model, the iterative builders and the renderer.
//! - [`source`]: The [`Backend`] trait and the filesystem, S3, GCS and Google Drive
//!   backends.
//! - [`mirror`]: Two-pass mirroring: directory skeleton, then file downloads.
//! - [`sample`]: Flattening to file entries and uniform random selection.
//! - [`config`]: TOML settings with environment overrides.
//! - [`log`]: The [`Logger`] capability passed into every operation.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod log;
pub mod mirror;
pub mod sample;
pub mod source;
pub mod tree;

#[cfg(test)]
mod test_support;

pub use config::settings::Config;
pub use error::{CoreError, CoreResult};
pub use log::{Logger, NullLogger, TracingLogger};
pub use mirror::{mirror_tree, MirrorReport};
pub use sample::{flatten_files, sample_and_download, select_sample, FlatEntry};
pub use source::{open_backend, Backend, SourceKind};
pub use tree::{render_tree, BuiltTree, TreeNode};

/// Normalises a string to NFC (composed) form.
///
/// macOS stores filenames in NFD (decomposed), which splits Korean Hangul
/// into individual Jamo. This helper re-composes them for display only;
/// the composed form may not name the file on disk.
pub fn nfc_string(s: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    s.nfc().collect()
}
