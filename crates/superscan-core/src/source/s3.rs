//! Amazon S3 backend over the AWS SDK.
//!
//! Listing walks ListObjectsV2 pages; the tree is synthesized from key
//! prefixes by [`synthesize_from_objects`], like any other bucket.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output};
use aws_sdk_s3::Client;
use tokio::io::AsyncWriteExt;

use super::{Backend, SourceKind};
use crate::config::settings::{HttpConfig, S3Config};
use crate::error::{CoreError, CoreResult};
use crate::log::Logger;
use crate::tree::{
    object_key, synthesize_from_objects, BuiltTree, ObjectLister, ObjectPage, ObjectSummary,
};

pub struct S3Backend {
    client: Client,
    bucket: String,
}

impl S3Backend {
    /// Loads AWS settings (region, credentials chain) and builds a client.
    ///
    /// Credentials are resolved lazily on the first request, so a missing
    /// profile shows up as a listing failure, not here.
    ///
    /// # Errors
    ///
    /// [`CoreError::BackendUnavailable`] when no bucket is configured.
    pub async fn new(config: &S3Config, http: &HttpConfig) -> CoreResult<Self> {
        if config.bucket.is_empty() {
            return Err(CoreError::BackendUnavailable(
                "no S3 bucket configured (set [s3] bucket or AWS_S3_BUCKET)".to_string(),
            ));
        }

        let timeouts = TimeoutConfig::builder()
            .operation_attempt_timeout(Duration::from_secs(http.timeout_secs))
            .build();
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeouts);
        if let Some(region) = config.region.as_deref().filter(|r| !r.is_empty()) {
            loader = loader.region(Region::new(region.to_string()));
        }
        let endpoint = config.endpoint.as_deref().filter(|e| !e.is_empty());
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(endpoint.is_some())
            .build();
        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }
}

/// Converts one ListObjectsV2 response into a page.
///
/// Objects without a key are dropped. The continuation token is only
/// followed while the response says it is truncated.
fn page_from_output(output: &ListObjectsV2Output) -> ObjectPage {
    let objects = output
        .contents()
        .iter()
        .filter_map(|object| {
            let key = object.key()?;
            let size = object.size().map_or(0, |size| u64::try_from(size).unwrap_or(0));
            Some(ObjectSummary {
                key: key.to_string(),
                size,
            })
        })
        .collect();
    let next_page_token = if output.is_truncated().unwrap_or(false) {
        output.next_continuation_token().map(str::to_string)
    } else {
        None
    };
    ObjectPage {
        objects,
        next_page_token,
    }
}

fn list_error(what: &str, err: SdkError<ListObjectsV2Error>) -> CoreError {
    match err.as_service_error() {
        Some(service) => list_service_error(what, service),
        None => CoreError::BackendUnavailable(format!("{what}: {}", DisplayErrorContext(&err))),
    }
}

fn list_service_error(what: &str, err: &ListObjectsV2Error) -> CoreError {
    if err.is_no_such_bucket() {
        CoreError::NotFound(what.to_string())
    } else {
        CoreError::BackendUnavailable(format!("{what}: {}", DisplayErrorContext(err)))
    }
}

fn get_error(what: &str, err: SdkError<GetObjectError>) -> CoreError {
    match err.as_service_error() {
        Some(service) => get_service_error(what, service),
        None => CoreError::BackendUnavailable(format!("{what}: {}", DisplayErrorContext(&err))),
    }
}

fn get_service_error(what: &str, err: &GetObjectError) -> CoreError {
    if err.is_no_such_key() {
        CoreError::NotFound(what.to_string())
    } else {
        CoreError::BackendUnavailable(format!("{what}: {}", DisplayErrorContext(err)))
    }
}

#[async_trait]
impl ObjectLister for S3Backend {
    async fn list_objects(
        &self,
        prefix: &str,
        page_token: Option<&str>,
    ) -> CoreResult<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_continuation_token(page_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| list_error(&format!("s3://{}/{prefix}", self.bucket), e))?;
        Ok(page_from_output(&output))
    }
}

#[async_trait]
impl Backend for S3Backend {
    fn kind(&self) -> SourceKind {
        SourceKind::S3
    }

    async fn build_tree(&self, source_path: &str, log: &dyn Logger) -> CoreResult<BuiltTree> {
        log.info(&format!("scanning s3://{}/{}", self.bucket, object_key(source_path)));
        synthesize_from_objects(self, source_path, &self.bucket, log).await
    }

    async fn download_file(&self, source_path: &str, destination: &Path) -> CoreResult<()> {
        let key = object_key(source_path);
        let what = format!("s3://{}/{key}", self.bucket);
        if key.is_empty() {
            return Err(CoreError::NotFound(what));
        }
        let mut output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| get_error(&what, e))?;

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| CoreError::local_io(destination, e))?;
        while let Some(chunk) = output.body.try_next().await.map_err(|e| {
            CoreError::BackendUnavailable(format!("{what}: download interrupted: {e}"))
        })? {
            file.write_all(&chunk)
                .await
                .map_err(|e| CoreError::local_io(destination, e))?;
        }
        file.flush().await.map_err(|e| CoreError::local_io(destination, e))
    }
}
