//! Shared HTTP plumbing for the remote backends.

use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;

use crate::error::{CoreError, CoreResult};

pub(crate) fn build_client(timeout_secs: u64) -> CoreResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("superscan/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| CoreError::BackendUnavailable(format!("cannot build HTTP client: {e}")))
}

pub(crate) fn transport_error(what: &str, e: reqwest::Error) -> CoreError {
    CoreError::BackendUnavailable(format!("{what}: {e}"))
}

/// Maps a 404 to [`CoreError::NotFound`] and any other failure status to
/// [`CoreError::BackendUnavailable`].
pub(crate) fn check_status(
    response: reqwest::Response,
    what: &str,
) -> CoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Err(CoreError::NotFound(what.to_string()))
    } else {
        Err(CoreError::BackendUnavailable(format!("{what}: HTTP {status}")))
    }
}

/// Streams a response body into a new file at `destination`.
pub(crate) async fn stream_to_file(
    mut response: reqwest::Response,
    destination: &Path,
) -> CoreResult<()> {
    let mut file = tokio::fs::File::create(destination)
        .await
        .map_err(|e| CoreError::local_io(destination, e))?;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transport_error("download interrupted", e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| CoreError::local_io(destination, e))?;
    }
    file.flush().await.map_err(|e| CoreError::local_io(destination, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn response(status: u16, body: &'static str) -> reqwest::Response {
        let raw = http::Response::builder().status(status).body(body).unwrap();
        reqwest::Response::from(raw)
    }

    #[test]
    fn success_passes_through() {
        let checked = check_status(response(200, "ok"), "gs://b/k").unwrap();
        assert_eq!(checked.status(), reqwest::StatusCode::OK);
    }

    #[test]
    fn missing_object_is_not_found() {
        let err = check_status(response(404, ""), "gs://b/k").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(ref what) if what == "gs://b/k"));
    }

    #[test]
    fn other_failures_are_unavailable() {
        for status in [401, 403, 429, 500, 503] {
            let err = check_status(response(status, ""), "gs://b/k").unwrap_err();
            match err {
                CoreError::BackendUnavailable(message) => {
                    assert!(message.contains(&status.to_string()), "{message}")
                }
                other => panic!("HTTP {status} mapped to {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn body_is_written_to_destination() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("object.bin");

        stream_to_file(response(200, "streamed bytes"), &dest).await.unwrap();

        assert_eq!(std::fs::read_to_string(dest).unwrap(), "streamed bytes");
    }

    #[tokio::test]
    async fn unwritable_destination_is_local_io() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("missing-dir").join("object.bin");

        let err = stream_to_file(response(200, "x"), &dest).await.unwrap_err();

        assert!(matches!(err, CoreError::LocalIo { .. }));
    }
}
