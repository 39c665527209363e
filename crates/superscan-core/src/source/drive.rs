//! Google Drive backend over the v3 REST API.
//!
//! Drive is addressed by file id, not by path. Folder paths given by the
//! user are resolved one segment at a time, and the ids of files seen while
//! building a tree are remembered so later downloads can skip the lookup.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::http::{build_client, check_status, stream_to_file, transport_error};
use super::{Backend, SourceKind};
use crate::config::settings::{DriveConfig, HttpConfig};
use crate::error::{CoreError, CoreResult};
use crate::log::Logger;
use crate::tree::{
    join_key, walk_directories, BuiltTree, DirectoryLister, ListedEntry, ListingTarget,
};

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const ROOT_ID: &str = "root";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,size)";

pub struct DriveBackend {
    client: reqwest::Client,
    api_base: Url,
    access_token: String,
    page_size: u32,
    /// Source key to file id, filled while listing.
    file_ids: Mutex<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    #[serde(default)]
    mime_type: String,
    size: Option<String>,
}

impl DriveFile {
    fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    fn into_entry(self) -> CoreResult<ListedEntry> {
        let is_dir = self.is_folder();
        // Native Docs/Sheets report no size.
        let size = match self.size.as_deref() {
            Some(raw) if !is_dir => raw.parse::<u64>().map_err(|_| {
                CoreError::BackendUnavailable(format!("invalid size {raw:?} for {}", self.name))
            })?,
            _ => 0,
        };
        Ok(ListedEntry {
            name: self.name,
            is_dir,
            size,
            id: self.id,
        })
    }
}

impl DriveBackend {
    /// # Errors
    ///
    /// [`CoreError::BackendUnavailable`] when no access token can be found
    /// or the API base is not a valid URL.
    pub fn new(config: &DriveConfig, http: &HttpConfig) -> CoreResult<Self> {
        let access_token = config.resolve_token()?;
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            CoreError::BackendUnavailable(format!(
                "invalid Drive API base {}: {e}",
                config.api_base
            ))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(CoreError::BackendUnavailable(format!(
                "invalid Drive API base {}",
                config.api_base
            )));
        }
        Ok(Self {
            client: build_client(http.timeout_secs)?,
            api_base,
            access_token,
            page_size: config.page_size.clamp(1, 1000),
            file_ids: Mutex::new(HashMap::new()),
        })
    }

    fn files_url(&self, file_id: Option<&str>) -> CoreResult<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                CoreError::BackendUnavailable(format!("invalid Drive API base {}", self.api_base))
            })?;
            segments.pop_if_empty().push("files");
            if let Some(id) = file_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn list_url(&self, query: &str, fields: &str, page_token: Option<&str>) -> CoreResult<Url> {
        let mut url = self.files_url(None)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("fields", fields);
            pairs.append_pair("pageSize", &self.page_size.to_string());
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url, what: &str) -> CoreResult<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| transport_error(what, e))?;
        check_status(response, what)
    }

    /// Runs `query` to completion, following page tokens.
    async fn search(&self, query: &str) -> CoreResult<Vec<DriveFile>> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = self.list_url(query, LIST_FIELDS, page_token.as_deref())?;
            let page: FileList = self
                .get(url, query)
                .await?
                .json()
                .await
                .map_err(|e| transport_error(query, e))?;
            files.extend(page.files);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(files),
            }
        }
    }

    /// Resolves a `/`-separated folder path to a folder id.
    ///
    /// An empty path or `root` is the user's My Drive. When several folders
    /// share a name, the first one returned wins.
    async fn resolve_folder(&self, path: &str) -> CoreResult<String> {
        let mut current = ROOT_ID.to_string();
        for part in folder_segments(path) {
            let found = self.search(&child_query(&current, part, true)).await?;
            let folder = found
                .into_iter()
                .next()
                .ok_or_else(|| CoreError::NotFound(format!("drive folder {part} in {path}")))?;
            current = folder.id;
        }
        Ok(current)
    }

    async fn resolve_file(&self, source_path: &str) -> CoreResult<String> {
        if let Some(id) = self.file_ids.lock().await.get(source_path) {
            return Ok(id.clone());
        }
        let trimmed = source_path.trim_end_matches('/');
        let (parent, name) = match trimmed.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", trimmed),
        };
        if name.is_empty() {
            return Err(CoreError::NotFound(format!("drive file {source_path}")));
        }
        let parent_id = self.resolve_folder(parent).await?;
        let found = self.search(&child_query(&parent_id, name, false)).await?;
        found
            .into_iter()
            .next()
            .map(|file| file.id)
            .ok_or_else(|| CoreError::NotFound(format!("drive file {source_path}")))
    }
}

#[async_trait]
impl DirectoryLister for DriveBackend {
    fn skips_hidden(&self) -> bool {
        false
    }

    async fn list_entries(
        &self,
        target: ListingTarget<'_>,
        _log: &dyn Logger,
    ) -> CoreResult<Vec<ListedEntry>> {
        let files = self.search(&children_query(target.id)).await?;
        let entries = files
            .into_iter()
            .map(DriveFile::into_entry)
            .collect::<CoreResult<Vec<_>>>()?;

        let mut ids = self.file_ids.lock().await;
        for entry in entries.iter().filter(|e| !e.is_dir) {
            ids.insert(join_key(target.path, &entry.name), entry.id.clone());
        }
        Ok(entries)
    }
}

#[async_trait]
impl Backend for DriveBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::GoogleDrive
    }

    async fn build_tree(&self, source_path: &str, log: &dyn Logger) -> CoreResult<BuiltTree> {
        let folder_id = self.resolve_folder(source_path).await?;
        let root_name = folder_segments(source_path)
            .last()
            .copied()
            .unwrap_or(ROOT_ID)
            .to_string();
        log.info(&format!("scanning drive folder {root_name} ({folder_id})"));
        walk_directories(self, &root_name, &folder_id, source_path, log).await
    }

    async fn download_file(&self, source_path: &str, destination: &Path) -> CoreResult<()> {
        let file_id = self.resolve_file(source_path).await?;
        let mut url = self.files_url(Some(&file_id))?;
        url.query_pairs_mut().append_pair("alt", "media");
        let what = format!("drive file {source_path}");
        let response = self.get(url, &what).await?;
        stream_to_file(response, destination).await
    }
}

/// Non-empty path segments, minus a leading `root`.
fn folder_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&ROOT_ID) {
        segments.remove(0);
    }
    segments
}

/// Escapes a literal for use inside single quotes in a Drive query.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn children_query(folder_id: &str) -> String {
    format!(
        "'{}' in parents and trashed = false",
        escape_query_value(folder_id)
    )
}

fn child_query(parent_id: &str, name: &str, folders: bool) -> String {
    let mime_test = if folders { "=" } else { "!=" };
    format!(
        "name = '{}' and mimeType {mime_test} '{FOLDER_MIME}' \
         and '{}' in parents and trashed = false",
        escape_query_value(name),
        escape_query_value(parent_id)
    )
}
