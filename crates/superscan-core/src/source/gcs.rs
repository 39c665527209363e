//! Google Cloud Storage backend over the JSON API.
//!
//! A bucket is a flat key space; the tree is synthesized from key prefixes
//! by [`synthesize_from_objects`].

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::http::{build_client, check_status, stream_to_file, transport_error};
use super::{Backend, SourceKind};
use crate::config::settings::{GcsConfig, HttpConfig};
use crate::error::{CoreError, CoreResult};
use crate::log::Logger;
use crate::tree::{
    object_key, synthesize_from_objects, BuiltTree, ObjectLister, ObjectPage, ObjectSummary,
};

pub struct GcsBackend {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    access_token: Option<String>,
}

impl GcsBackend {
    /// # Errors
    ///
    /// [`CoreError::BackendUnavailable`] when no bucket is configured or the
    /// endpoint is not a valid base URL.
    pub fn new(config: &GcsConfig, http: &HttpConfig) -> CoreResult<Self> {
        if config.bucket.is_empty() {
            return Err(CoreError::BackendUnavailable(
                "no GCS bucket configured (set [gcs] bucket or SUPERSCAN_GCS_BUCKET)".to_string(),
            ));
        }
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            CoreError::BackendUnavailable(format!("invalid GCS endpoint {}: {e}", config.endpoint))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(CoreError::BackendUnavailable(format!(
                "invalid GCS endpoint {}",
                config.endpoint
            )));
        }
        Ok(Self {
            client: build_client(http.timeout_secs)?,
            endpoint,
            bucket: config.bucket.clone(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url_with_segments(&self, segments: &[&str]) -> CoreResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CoreError::BackendUnavailable(format!("invalid GCS endpoint {}", self.endpoint))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn list_url(&self, prefix: &str, page_token: Option<&str>) -> CoreResult<Url> {
        let mut url = self.url_with_segments(&["storage", "v1", "b", self.bucket.as_str(), "o"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("prefix", prefix);
            query.append_pair("fields", "items(name,size),nextPageToken");
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }

    fn download_url(&self, key: &str) -> CoreResult<Url> {
        let bucket = self.bucket.as_str();
        let mut url =
            self.url_with_segments(&["download", "storage", "v1", "b", bucket, "o", key])?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    async fn get(&self, url: Url, what: &str) -> CoreResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|e| transport_error(what, e))?;
        check_status(response, what)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    /// The JSON API encodes 64-bit integers as strings.
    size: Option<String>,
}

impl ListResponse {
    fn into_page(self) -> CoreResult<ObjectPage> {
        let objects = self
            .items
            .into_iter()
            .map(|item| -> CoreResult<ObjectSummary> {
                let size = match item.size.as_deref() {
                    None => 0,
                    Some(raw) => raw.parse::<u64>().map_err(|_| {
                        CoreError::BackendUnavailable(format!(
                            "invalid size {raw:?} for {}",
                            item.name
                        ))
                    })?,
                };
                Ok(ObjectSummary {
                    key: item.name,
                    size,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(ObjectPage {
            objects,
            next_page_token: self.next_page_token,
        })
    }
}

#[async_trait]
impl ObjectLister for GcsBackend {
    async fn list_objects(&self, prefix: &str, page_token: Option<&str>) -> CoreResult<ObjectPage> {
        let what = format!("gs://{}/{prefix}", self.bucket);
        let url = self.list_url(prefix, page_token)?;
        let response = self.get(url, &what).await?;
        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| transport_error(&what, e))?;
        body.into_page()
    }
}

#[async_trait]
impl Backend for GcsBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Gcs
    }

    async fn build_tree(&self, source_path: &str, log: &dyn Logger) -> CoreResult<BuiltTree> {
        log.info(&format!("scanning gs://{}/{}", self.bucket, object_key(source_path)));
        synthesize_from_objects(self, source_path, &self.bucket, log).await
    }

    async fn download_file(&self, source_path: &str, destination: &Path) -> CoreResult<()> {
        let key = object_key(source_path);
        if key.is_empty() {
            return Err(CoreError::NotFound(format!("gs://{}/", self.bucket)));
        }
        let what = format!("gs://{}/{key}", self.bucket);
        let response = self.get(self.download_url(&key)?, &what).await?;
        stream_to_file(response, destination).await
    }
}
