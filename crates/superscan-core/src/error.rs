//! Error types for `superscan-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.

use std::path::{Path, PathBuf};

/// Unified error type for all core operations.
///
/// Each variant captures just enough context for the caller to display
/// a meaningful message or take corrective action.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A listing or single-file call against the backend failed
    /// (I/O, authentication, network).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The requested path, key or folder does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A directory was expected but the path points to a file.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Creating a directory or writing a file on the local disk failed.
    #[error("local I/O error at {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// The source kind is not one of the supported backends.
    #[error("invalid source type: {0}")]
    InvalidSource(String),
}

impl CoreError {
    /// Wraps an I/O error that happened while touching `path` on the local disk.
    pub fn local_io(path: &Path, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns `true` for [`CoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience alias used throughout `superscan-core`.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_unavailable_displays_message() {
        let err = CoreError::BackendUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "backend unavailable: connection refused");
    }

    #[test]
    fn not_found_displays_key() {
        let err = CoreError::NotFound("bucket/missing.txt".to_string());
        assert_eq!(err.to_string(), "not found: bucket/missing.txt");
        assert!(err.is_not_found());
    }

    #[test]
    fn not_a_directory_displays_path() {
        let err = CoreError::NotADirectory(PathBuf::from("/some/file.txt"));
        assert_eq!(err.to_string(), "not a directory: /some/file.txt");
        assert!(!err.is_not_found());
    }

    #[test]
    fn local_io_keeps_path_and_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CoreError::local_io(Path::new("/dest/dir"), io_err);
        assert!(matches!(err, CoreError::LocalIo { .. }));
        let msg = err.to_string();
        assert!(msg.contains("/dest/dir"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn config_parse_displays_message() {
        let err = CoreError::ConfigParse("unexpected token".to_string());
        assert_eq!(err.to_string(), "config parse error: unexpected token");
    }

    #[test]
    fn invalid_source_displays_name() {
        let err = CoreError::InvalidSource("ftp".to_string());
        assert_eq!(err.to_string(), "invalid source type: ftp");
    }

    #[test]
    fn core_result_err() {
        let result: CoreResult<i32> = Err(CoreError::NotFound("x".to_string()));
        assert!(result.is_err());
    }
}
