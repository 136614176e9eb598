//! Artifact download shared by both backend adapters.

use std::path::Path;

use reqwest::Client;
use tracing::{debug, info};

use crate::error::{VideogenError, VideogenResult};

/// Download a finished artifact to a local path.
///
/// The parent directory is created if needed. Returns the byte count.
pub async fn download_artifact(
    http: &Client,
    video_url: &str,
    output_path: &Path,
) -> VideogenResult<u64> {
    debug!("Downloading artifact from {}", video_url);

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let response = http
        .get(video_url)
        .send()
        .await
        .map_err(|e| VideogenError::fetch(format!("GET {video_url}: {e}")))?;

    if !response.status().is_success() {
        return Err(VideogenError::fetch(format!(
            "GET {video_url}: status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| VideogenError::fetch(format!("reading body: {e}")))?;

    tokio::fs::write(output_path, &bytes).await?;

    let size = bytes.len() as u64;
    info!(
        "Artifact saved to {} ({:.2} MB)",
        output_path.display(),
        size as f64 / (1024.0 * 1024.0)
    );
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4data".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/video.mp4");
        let size = download_artifact(
            &Client::new(),
            &format!("{}/video.mp4", server.uri()),
            &out,
        )
        .await
        .unwrap();

        assert_eq!(size, 7);
        assert_eq!(std::fs::read(&out).unwrap(), b"mp4data");
    }

    #[tokio::test]
    async fn test_download_non_2xx_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = download_artifact(
            &Client::new(),
            &format!("{}/gone.mp4", server.uri()),
            &dir.path().join("out.mp4"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, VideogenError::Fetch(_)));
    }
}
