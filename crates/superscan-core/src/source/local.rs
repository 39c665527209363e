//! Local file system backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Backend, SourceKind};
use crate::error::{CoreError, CoreResult};
use crate::log::Logger;
use crate::tree::{walk_directories, BuiltTree, DirectoryLister, ListedEntry, ListingTarget};

/// Reads trees from, and copies files out of, the local file system.
///
/// Names starting with `.` are skipped while walking. Entries are listed in
/// file name order under their on-disk names, so every listed name can be
/// opened again. Names that are not valid UTF-8 are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirectoryLister for LocalBackend {
    fn skips_hidden(&self) -> bool {
        true
    }

    async fn list_entries(
        &self,
        target: ListingTarget<'_>,
        log: &dyn Logger,
    ) -> CoreResult<Vec<ListedEntry>> {
        let dir = Path::new(target.id);
        let mut read_dir = tokio::fs::read_dir(dir).await.map_err(|e| io_to_core(dir, e))?;

        let mut found = Vec::new();
        while let Some(dir_entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| CoreError::BackendUnavailable(format!("{}: {e}", dir.display())))?
        {
            let name = match dir_entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    log.error(&format!(
                        "skipping {}: file name is not valid UTF-8",
                        dir.join(raw).display()
                    ));
                    continue;
                }
            };
            // An entry that vanished or cannot be stat'ed is left out.
            let metadata = match dir_entry.metadata().await {
                Ok(m) => m,
                Err(_) => continue,
            };
            found.push((name, dir_entry.path(), metadata));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(found
            .into_iter()
            .map(|(name, path, metadata)| ListedEntry {
                name,
                is_dir: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                id: path.to_string_lossy().into_owned(),
            })
            .collect())
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Filesystem
    }

    /// Walks the directory at `source_path` (the current directory when
    /// empty). The root is named after the last component of its absolute
    /// path.
    async fn build_tree(&self, source_path: &str, log: &dyn Logger) -> CoreResult<BuiltTree> {
        let requested = if source_path.is_empty() { "." } else { source_path };
        let absolute = tokio::fs::canonicalize(requested)
            .await
            .map_err(|e| io_to_core(Path::new(requested), e))?;
        let metadata = tokio::fs::metadata(&absolute)
            .await
            .map_err(|e| io_to_core(&absolute, e))?;
        if !metadata.is_dir() {
            return Err(CoreError::NotADirectory(absolute));
        }

        let root_name = root_name(&absolute);
        let Some(root_id) = absolute.to_str().map(str::to_string) else {
            return Err(CoreError::BackendUnavailable(format!(
                "{}: path is not valid UTF-8",
                absolute.display()
            )));
        };
        log.info(&format!("scanning {}", absolute.display()));
        walk_directories(self, &root_name, &root_id, source_path, log).await
    }

    async fn download_file(&self, source_path: &str, destination: &Path) -> CoreResult<()> {
        let source = PathBuf::from(source_path);
        let metadata = tokio::fs::metadata(&source)
            .await
            .map_err(|e| io_to_core(&source, e))?;
        if metadata.is_dir() {
            return Err(CoreError::BackendUnavailable(format!(
                "{source_path} is a directory"
            )));
        }
        tokio::fs::copy(&source, destination)
            .await
            .map_err(|e| CoreError::local_io(destination, e))?;
        Ok(())
    }
}

fn root_name(absolute: &Path) -> String {
    match absolute.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => absolute.to_string_lossy().into_owned(),
    }
}

fn io_to_core(path: &Path, e: std::io::Error) -> CoreError {
    if e.kind() == std::io::ErrorKind::NotFound {
        CoreError::NotFound(path.display().to_string())
    } else {
        CoreError::BackendUnavailable(format!("{}: {e}", path.display()))
    }
}
