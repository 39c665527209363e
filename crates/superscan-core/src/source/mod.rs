//! Storage backends.
//!
//! Every backend implements [`Backend`]: build a tree from a source path and
//! download a single file. The mirror engine and the sampler only ever see
//! `&dyn Backend`.

pub mod drive;
pub mod gcs;
mod http;
pub mod local;
pub mod s3;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;

use crate::config::settings::Config;
use crate::error::{CoreError, CoreResult};
use crate::log::Logger;
use crate::tree::BuiltTree;

pub use drive::DriveBackend;
pub use gcs::GcsBackend;
pub use local::LocalBackend;
pub use s3::S3Backend;

/// The kinds of source SuperScan can scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Filesystem,
    S3,
    Gcs,
    GoogleDrive,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [Self::Filesystem, Self::S3, Self::Gcs, Self::GoogleDrive];

    /// The name accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::S3 => "s3",
            Self::Gcs => "gcs",
            Self::GoogleDrive => "google-drive",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Filesystem => "Local File System",
            Self::S3 => "AWS S3 Storage",
            Self::Gcs => "Google Cloud Storage",
            Self::GoogleDrive => "Google Drive Storage",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filesystem" | "fs" => Ok(Self::Filesystem),
            "s3" => Ok(Self::S3),
            "gcs" => Ok(Self::Gcs),
            "google-drive" | "gdrive" => Ok(Self::GoogleDrive),
            other => Err(CoreError::InvalidSource(other.to_string())),
        }
    }
}

/// Capability set a storage provider exposes to the core.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Builds the tree rooted at `source_path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the path does not exist.
    /// - [`CoreError::BackendUnavailable`] if the root cannot be listed.
    async fn build_tree(&self, source_path: &str, log: &dyn Logger) -> CoreResult<BuiltTree>;

    /// Copies one file from the backend to `destination`.
    ///
    /// `source_path` is the `/`-joined key of the file (the scan's source
    /// path followed by the file's ancestor names). The parent directory of
    /// `destination` must already exist.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the source does not exist.
    /// - [`CoreError::BackendUnavailable`] if the backend call fails.
    /// - [`CoreError::LocalIo`] if the destination cannot be written.
    async fn download_file(&self, source_path: &str, destination: &Path) -> CoreResult<()>;
}

/// Constructs the backend for `kind` from configuration.
///
/// # Errors
///
/// Returns [`CoreError::BackendUnavailable`] when a required setting
/// (bucket, access token) is missing.
pub async fn open_backend(kind: SourceKind, config: &Config) -> CoreResult<Box<dyn Backend>> {
    match kind {
        SourceKind::Filesystem => Ok(Box::new(LocalBackend::new())),
        SourceKind::S3 => Ok(Box::new(S3Backend::new(&config.s3, &config.http).await?)),
        SourceKind::Gcs => Ok(Box::new(GcsBackend::new(&config.gcs, &config.http)?)),
        SourceKind::GoogleDrive => {
            Ok(Box::new(DriveBackend::new(&config.drive, &config.http)?))
        }
    }
}
