//! Application configuration loaded from a TOML file.
//!
//! Every field has a default, so SuperScan runs without a config file as long
//! as the chosen backend's credentials come from the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SUPERSCAN_CONFIG";

/// Top-level application configuration.
///
/// Call [`Config::load`] to read a specific TOML path, or
/// [`Config::load_default`] for the usual lookup plus environment overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub s3: S3Config,
    #[serde(default)]
    pub gcs: GcsConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::LocalIo`] if the file cannot be read.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.display().to_string()),
            _ => CoreError::local_io(path, e),
        })?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Loads `$SUPERSCAN_CONFIG` or `$HOME/.superscan/config.toml`, then
    /// applies environment overrides.
    ///
    /// A missing default file is not an error; an explicitly named one is.
    pub fn load_default() -> CoreResult<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::load(&path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overrides credentials with values returned by `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(bucket) = get("AWS_S3_BUCKET") {
            self.s3.bucket = bucket;
        }
        if let Some(bucket) = get("SUPERSCAN_GCS_BUCKET") {
            self.gcs.bucket = bucket;
        }
        if let Some(token) = get("SUPERSCAN_GCS_TOKEN") {
            self.gcs.access_token = Some(token);
        }
        if let Some(token) = get("SUPERSCAN_DRIVE_TOKEN") {
            self.drive.access_token = Some(token);
        }
        if let Some(file) = get("SUPERSCAN_DRIVE_TOKEN_FILE") {
            self.drive.token_file = Some(PathBuf::from(file));
        }
    }
}

/// `$HOME/.superscan/config.toml`, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".superscan").join("config.toml"))
}

/// General preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Amazon S3 settings.
///
/// Credentials come from the standard AWS chain (environment, shared
/// profile files, instance metadata).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default)]
    pub bucket: String,
    /// Region of the bucket. When unset, the AWS chain decides (`AWS_REGION`,
    /// profile).
    #[serde(default)]
    pub region: Option<String>,
    /// Path used when `--path` is not given. Empty lists the whole bucket.
    #[serde(default)]
    pub start_path: String,
    /// Endpoint of an S3-compatible store. Requests then use path-style
    /// addressing.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Google Cloud Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcsConfig {
    #[serde(default)]
    pub bucket: String,
    /// Path used when `--path` is not given. Empty lists the whole bucket.
    #[serde(default)]
    pub start_path: String,
    /// OAuth bearer token. Public buckets work without one.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_gcs_endpoint")]
    pub endpoint: String,
}

impl Default for GcsConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            start_path: String::new(),
            access_token: None,
            endpoint: default_gcs_endpoint(),
        }
    }
}

/// Google Drive settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default)]
    pub access_token: Option<String>,
    /// JSON file holding an `access_token` field, read when
    /// `access_token` is unset.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default = "default_drive_start")]
    pub start_path: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_drive_api")]
    pub api_base: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            token_file: None,
            start_path: default_drive_start(),
            page_size: default_page_size(),
            api_base: default_drive_api(),
        }
    }
}

#[derive(Deserialize)]
struct TokenFile {
    access_token: String,
}

impl DriveConfig {
    /// The bearer token to use: `access_token`, else the one in `token_file`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::BackendUnavailable`] if neither is configured, or the
    ///   token file lacks a usable token.
    /// - [`CoreError::LocalIo`] if the token file cannot be read.
    pub fn resolve_token(&self) -> CoreResult<String> {
        if let Some(token) = self.access_token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        let Some(path) = &self.token_file else {
            return Err(CoreError::BackendUnavailable(
                "google drive access token is not configured".to_string(),
            ));
        };
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::local_io(path, e))?;
        let parsed: TokenFile = serde_json::from_str(&content).map_err(|e| {
            CoreError::BackendUnavailable(format!("invalid token file {}: {e}", path.display()))
        })?;
        if parsed.access_token.is_empty() {
            return Err(CoreError::BackendUnavailable(format!(
                "token file {} has an empty access_token",
                path.display()
            )));
        }
        Ok(parsed.access_token)
    }
}

/// HTTP client settings shared by remote backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_gcs_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_drive_start() -> String {
    "root".to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_drive_api() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}
